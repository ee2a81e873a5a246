//! Resource model for host-scoped records.
//!
//! Every resource is declared against exactly one backend host, identified by an opaque
//! owner identifier, and may reference other resources by name. The set of resource kinds
//! is closed: [`Resource`] is a sum type and each variant describes the references it
//! carries through [`Resource::references`], so adding a kind means adding a variant and
//! its match arms.
//!
//! ## Reference Resolution
//!
//! References are resolved either by record identifier (the name of the record in the
//! shared namespace) or by backend name (the name of the resource on its host). Fields
//! holding raw storage paths are not references: they are reported by
//! [`Resource::opaque_fields`] and never resolved.

use std::fmt::Display;

/// Kind of a host-scoped resource.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Virtual machine domain
    Domain,
    /// Storage volume
    Volume,
    /// Storage pool
    Pool,
    /// Boot-configuration (cloud-init) disk
    BootDisk,
}

impl ResourceKind {
    /// Returns the kind token used in logs, messages and inventory files
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Domain => "domain",
            ResourceKind::Volume => "volume",
            ResourceKind::Pool => "pool",
            ResourceKind::BootDisk => "boot-disk",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResourceKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "domain" => Ok(ResourceKind::Domain),
            "volume" => Ok(ResourceKind::Volume),
            "pool" => Ok(ResourceKind::Pool),
            "boot-disk" | "bootdisk" | "cloudinit" => Ok(ResourceKind::BootDisk),
            other => Err(format!("unknown resource kind '{other}'")),
        }
    }
}

/// Disk device attached to a domain.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Disk {
    /// Raw storage path or identifier of the backing volume on the host
    pub volume_id: Option<String>,
}

/// Virtual machine domain.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Domain {
    /// Domain name on the backend host
    pub name: String,
    /// Owning-host identifier
    pub owner: Option<String>,
    /// Previously generated record identifier, if any
    pub record_id: Option<String>,
    /// Record identifier of the boot disk attached at first boot
    pub boot_disk: Option<String>,
    /// Disk devices
    pub disks: Vec<Disk>,
}

/// Storage volume.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Volume {
    /// Volume name on the backend host
    pub name: String,
    /// Owning-host identifier
    pub owner: Option<String>,
    /// Previously generated record identifier, if any
    pub record_id: Option<String>,
    /// Backend name of the pool holding the volume
    pub pool: Option<String>,
    /// Raw path or identifier of the base volume on the host
    pub base_volume_id: Option<String>,
}

/// Resource without references of its own, such as a pool or a boot disk.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Leaf {
    /// Resource name on the backend host
    pub name: String,
    /// Owning-host identifier
    pub owner: Option<String>,
    /// Previously generated record identifier, if any
    pub record_id: Option<String>,
}

/// How a reference is resolved against existing records.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ResolveBy {
    /// Exact record identifier, zero or one candidate
    RecordId,
    /// Backend name, any number of candidates
    BackendName,
}

/// Typed reference from one resource to another.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reference<'a> {
    /// Kind of the referenced resource
    pub kind: ResourceKind,
    /// Name the referenced resource is looked up by
    pub name: &'a str,
    /// Resolution mode
    pub by: ResolveBy,
}

/// Host-scoped resource submitted for admission.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Resource {
    Domain(Domain),
    Volume(Volume),
    Pool(Leaf),
    BootDisk(Leaf),
}

impl Resource {
    /// Creates a pool resource
    pub fn new_pool(name: &str, owner: Option<&str>) -> Self {
        Self::Pool(Leaf {
            name: name.to_string(),
            owner: owner.map(str::to_string),
            record_id: None,
        })
    }

    /// Creates a boot disk resource
    pub fn new_boot_disk(name: &str, owner: Option<&str>) -> Self {
        Self::BootDisk(Leaf {
            name: name.to_string(),
            owner: owner.map(str::to_string),
            record_id: None,
        })
    }

    /// Returns the kind of this resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Domain(_) => ResourceKind::Domain,
            Resource::Volume(_) => ResourceKind::Volume,
            Resource::Pool(_) => ResourceKind::Pool,
            Resource::BootDisk(_) => ResourceKind::BootDisk,
        }
    }

    /// Returns the name of this resource on its backend host
    pub fn backend_name(&self) -> &str {
        match self {
            Resource::Domain(domain) => &domain.name,
            Resource::Volume(volume) => &volume.name,
            Resource::Pool(leaf) | Resource::BootDisk(leaf) => &leaf.name,
        }
    }

    /// Returns the owning-host identifier, treating an empty one as absent
    pub fn owner(&self) -> Option<&str> {
        let owner = match self {
            Resource::Domain(domain) => domain.owner.as_deref(),
            Resource::Volume(volume) => volume.owner.as_deref(),
            Resource::Pool(leaf) | Resource::BootDisk(leaf) => leaf.owner.as_deref(),
        };
        owner.filter(|owner| !owner.is_empty())
    }

    /// Returns the record identifier the resource was submitted with, if any
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Resource::Domain(domain) => domain.record_id.as_deref(),
            Resource::Volume(volume) => volume.record_id.as_deref(),
            Resource::Pool(leaf) | Resource::BootDisk(leaf) => leaf.record_id.as_deref(),
        }
    }

    /// Sets the record identifier of this resource
    pub fn with_record_id(mut self, record_id: &str) -> Self {
        let slot = match &mut self {
            Resource::Domain(domain) => &mut domain.record_id,
            Resource::Volume(volume) => &mut volume.record_id,
            Resource::Pool(leaf) | Resource::BootDisk(leaf) => &mut leaf.record_id,
        };
        *slot = Some(record_id.to_string());
        self
    }

    /// Returns the references carried by this resource.
    ///
    /// A reference whose field is present but empty is still returned, with an empty
    /// name, so that validation can reject it.
    pub fn references(&self) -> Vec<Reference<'_>> {
        match self {
            Resource::Domain(domain) => domain
                .boot_disk
                .as_deref()
                .map(|name| Reference {
                    kind: ResourceKind::BootDisk,
                    name,
                    by: ResolveBy::RecordId,
                })
                .into_iter()
                .collect(),
            Resource::Volume(volume) => volume
                .pool
                .as_deref()
                .map(|name| Reference {
                    kind: ResourceKind::Pool,
                    name,
                    by: ResolveBy::BackendName,
                })
                .into_iter()
                .collect(),
            Resource::Pool(_) | Resource::BootDisk(_) => Vec::new(),
        }
    }

    /// Returns the raw path fields of this resource as `(field, value)` pairs.
    ///
    /// These identify storage on the backend host directly and are not checked
    /// against records.
    pub fn opaque_fields(&self) -> Vec<(String, &str)> {
        match self {
            Resource::Domain(domain) => domain
                .disks
                .iter()
                .enumerate()
                .filter_map(|(i, disk)| {
                    disk.volume_id
                        .as_deref()
                        .filter(|id| !id.is_empty())
                        .map(|id| (format!("disk[{i}].volume_id"), id))
                })
                .collect(),
            Resource::Volume(volume) => volume
                .base_volume_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(|id| ("base_volume_id".to_string(), id))
                .into_iter()
                .collect(),
            Resource::Pool(_) | Resource::BootDisk(_) => Vec::new(),
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}@{}", self.kind(), self.backend_name(), self.owner().unwrap_or(""))
    }
}
