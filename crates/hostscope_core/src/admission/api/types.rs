//! Admission API type definitions.
//!
//! This module defines the request and response types exchanged with the admission
//! service and with the record lookup capability it depends on.
//!
//! ## Admission API
//! Submitted by the resource-admission path of the control plane whenever a resource is
//! created, updated or deleted. Creation and update compute the record identifier and
//! run cross-host reference validation; deletion is always acknowledged.
//!
//! ## Lookup API
//! Read-only queries against the records already stored in the control plane. The lookup
//! capability is supplied by the storage layer and injected into the admission service as
//! a [`tower::Service`].

use std::collections::BTreeMap;

use crate::admission::infrastructure::resource::{Resource, ResourceKind};

/// Admission request types.
#[derive(Debug, Clone)]
pub enum AdmissionRequest {
    /// Admit a newly declared resource.
    Create(Resource),

    /// Admit a new revision of an existing resource.
    ///
    /// Only the new revision is validated; the old one is kept for logging.
    Update {
        /// Revision currently stored
        old: Resource,
        /// Revision being submitted
        new: Resource,
    },

    /// Acknowledge the removal of a resource.
    ///
    /// Removing a resource cannot introduce a cross-host inconsistency, so no
    /// validation or lookup takes place.
    Delete(Resource),
}

/// Record accepted into the reconciliation pipeline.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AdmittedRecord {
    /// Identifier of the record in the shared namespace
    pub record_id: String,
    /// Operator-facing labels (owning host)
    pub labels: BTreeMap<String, String>,
    /// Operator-facing annotations (original backend name)
    pub annotations: BTreeMap<String, String>,
}

/// Admission response types.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AdmissionResponse {
    /// Resource admitted under the enclosed record.
    Admitted(AdmittedRecord),

    /// Acknowledgment of a deletion.
    Ack,
}

/// Record already stored in the control plane, as seen through the lookup capability.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LookupRecord {
    /// Kind of the record
    pub kind: ResourceKind,
    /// Identifier of the record in the shared namespace
    pub record_id: String,
    /// Name of the resource on its backend host, when declared
    pub backend_name: Option<String>,
    /// Owning-host identifier, when declared
    pub owner: Option<String>,
}

impl LookupRecord {
    /// Creates a lookup record
    pub fn new(
        kind: ResourceKind,
        record_id: &str,
        backend_name: Option<&str>,
        owner: Option<&str>,
    ) -> Self {
        Self {
            kind,
            record_id: record_id.to_string(),
            backend_name: backend_name.map(str::to_string),
            owner: owner.map(str::to_string),
        }
    }

    /// Returns the owning-host identifier, with an absent owner read as empty
    pub fn owner_or_empty(&self) -> &str {
        self.owner.as_deref().unwrap_or_default()
    }
}

/// Lookup request types.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LookupRequest {
    /// Find every record of `kind` declaring `name` as backend name.
    FindByBackendName { kind: ResourceKind, name: String },

    /// Get the record of `kind` identified by `record_id`.
    GetByRecordId { kind: ResourceKind, record_id: String },
}

/// Lookup response types.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LookupResponse {
    /// Zero or more candidates, answering `FindByBackendName`.
    Records(Vec<LookupRecord>),

    /// Zero or one record, answering `GetByRecordId`.
    Record(Option<LookupRecord>),
}
