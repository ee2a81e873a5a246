//! Record inventories and candidate resources for the admission CLI.
//!
//! An inventory lists the records already stored in the control plane, one per line:
//!
//! `KIND RECORD_ID OWNER [BACKEND_NAME]`
//!
//! where:
//! - KIND := "domain" | "volume" | "pool" | "boot-disk"
//! - OWNER := owning-host identifier, or `-` for a record that declares none
//! - BACKEND_NAME := name of the resource on its host, defaults to RECORD_ID
//!
//! Blank lines and lines starting with `#` are ignored.
//!
//! Examples:
//! - `pool libvirt-host1-default libvirt-host1 default`
//! - `boot-disk host1-web-seed libvirt-host1`

use std::{
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::Context;
use hostscope_core::admission::{
    api::LookupRecord,
    infrastructure::resource::{Disk, Domain, Leaf, Resource, ResourceKind, Volume},
    services::lookup::RecordIndex,
};

/// Owner token of records declaring no owning host
const NO_OWNER: &str = "-";

/// One parsed inventory line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEntry {
    /// Blank or comment line
    Nil,
    Record(LookupRecord),
}

impl TryFrom<&str> for InventoryEntry {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('#') {
            return Ok(InventoryEntry::Nil);
        }

        let parts: Vec<&str> = s.split_whitespace().collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(anyhow::anyhow!(
                "Invalid inventory line, expected KIND RECORD_ID OWNER [BACKEND_NAME], got {} fields",
                parts.len()
            ));
        }

        let kind = ResourceKind::try_from(parts[0]).map_err(|e| anyhow::anyhow!(e))?;
        let record_id = parts[1];
        let owner = Some(parts[2]).filter(|owner| *owner != NO_OWNER);
        let backend_name = parts.get(3).copied().unwrap_or(record_id);
        Ok(InventoryEntry::Record(LookupRecord::new(kind, record_id, Some(backend_name), owner)))
    }
}

/// Reads an inventory into a new record index.
pub fn read_inventory(reader: impl BufRead) -> anyhow::Result<RecordIndex> {
    let index = RecordIndex::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        match InventoryEntry::try_from(line.as_str())
            .with_context(|| format!("line {}: {}", line_num + 1, line.trim()))?
        {
            InventoryEntry::Nil => {}
            InventoryEntry::Record(record) => {
                if let Some(previous) = index.insert(record) {
                    return Err(anyhow::anyhow!(
                        "line {}: duplicate {} record {}",
                        line_num + 1,
                        previous.kind,
                        previous.record_id
                    ));
                }
            }
        }
    }
    Ok(index)
}

/// Loads the inventory file at `path`.
pub fn load_inventory(path: impl AsRef<Path>) -> anyhow::Result<RecordIndex> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open inventory '{}': {}", path.display(), e))?;
    read_inventory(BufReader::new(file))
        .with_context(|| format!("Invalid inventory '{}'", path.display()))
}

/// Resource described on the command line, before its kind-specific checks.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub name: String,
    pub owner: Option<String>,
    pub record_id: Option<String>,
    /// Domains only
    pub boot_disk: Option<String>,
    /// Domains only
    pub disks: Vec<String>,
    /// Volumes only
    pub pool: Option<String>,
    /// Volumes only
    pub base_volume: Option<String>,
}

impl Candidate {
    /// Builds the resource of `kind`, refusing fields that do not apply to it.
    pub fn into_resource(self, kind: ResourceKind) -> anyhow::Result<Resource> {
        let domain_only = self.boot_disk.is_some() || !self.disks.is_empty();
        let volume_only = self.pool.is_some() || self.base_volume.is_some();
        if domain_only && kind != ResourceKind::Domain {
            return Err(anyhow::anyhow!(
                "--boot-disk and --disk only apply to domains, not to {kind}"
            ));
        }
        if volume_only && kind != ResourceKind::Volume {
            return Err(anyhow::anyhow!(
                "--pool and --base-volume only apply to volumes, not to {kind}"
            ));
        }

        let resource = match kind {
            ResourceKind::Domain => Resource::Domain(Domain {
                name: self.name,
                owner: self.owner,
                record_id: self.record_id,
                boot_disk: self.boot_disk,
                disks: self
                    .disks
                    .into_iter()
                    .map(|volume_id| Disk { volume_id: Some(volume_id) })
                    .collect(),
            }),
            ResourceKind::Volume => Resource::Volume(Volume {
                name: self.name,
                owner: self.owner,
                record_id: self.record_id,
                pool: self.pool,
                base_volume_id: self.base_volume,
            }),
            ResourceKind::Pool => Resource::Pool(Leaf {
                name: self.name,
                owner: self.owner,
                record_id: self.record_id,
            }),
            ResourceKind::BootDisk => Resource::BootDisk(Leaf {
                name: self.name,
                owner: self.owner,
                record_id: self.record_id,
            }),
        };
        Ok(resource)
    }
}
