//! In-memory record index answering lookup requests.
//!
//! The admission service reads existing records through any [`tower::Service`] accepting
//! [`LookupRequest`]. In production this is an adapter over the control-plane storage;
//! [`RecordIndex`] is the in-process implementation, used for tests and for inventories
//! loaded from files.
use std::{future::Future, pin::Pin, sync::Arc, task::Poll};

use dashmap::DashMap;
use tower::Service;
#[cfg(feature = "hostscope_tracing")]
use tracing::debug;

use crate::admission::{
    api::types::{LookupRecord, LookupRequest, LookupResponse},
    error::AdmissionError,
    infrastructure::resource::ResourceKind,
};

type RecordMap = DashMap<(ResourceKind, String), LookupRecord>;

/// Concurrent index of records keyed by kind and record identifier.
///
/// Clones share the same underlying map, so records inserted through one handle are
/// immediately visible to lookups made through any other.
#[derive(Default, Clone, Debug)]
pub struct RecordIndex {
    records: Arc<RecordMap>,
}

impl RecordIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the given records, replacing records with the same kind and identifier.
    pub fn with_records(self, records: impl IntoIterator<Item = LookupRecord>) -> Self {
        for record in records {
            self.insert(record);
        }
        self
    }

    /// Inserts a record, returning the record it replaces if any
    pub fn insert(&self, record: LookupRecord) -> Option<LookupRecord> {
        self.records.insert((record.kind, record.record_id.clone()), record)
    }

    /// Removes a record, returning it if it was present
    pub fn remove(&self, kind: ResourceKind, record_id: &str) -> Option<LookupRecord> {
        self.records.remove(&(kind, record_id.to_string())).map(|(_, record)| record)
    }

    /// Returns the number of indexed records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the index holds no record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record of `kind` identified by `record_id`
    pub fn get_by_record_id(&self, kind: ResourceKind, record_id: &str) -> Option<LookupRecord> {
        self.records.get(&(kind, record_id.to_string())).map(|record| record.clone())
    }

    /// Returns every record of `kind` declaring `name` as backend name.
    ///
    /// Candidates are ordered by record identifier so that repeated lookups over an
    /// unchanged index return identical answers.
    pub fn find_by_backend_name(&self, kind: ResourceKind, name: &str) -> Vec<LookupRecord> {
        let mut records: Vec<LookupRecord> = self
            .records
            .iter()
            .filter(|entry| {
                entry.key().0 == kind && entry.value().backend_name.as_deref() == Some(name)
            })
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        records
    }
}

impl Service<LookupRequest> for RecordIndex {
    type Response = LookupResponse;
    type Error = AdmissionError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: LookupRequest) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            match request {
                LookupRequest::FindByBackendName { kind, name } => {
                    #[cfg(feature = "hostscope_tracing")]
                    debug!("[lookup] FindByBackendName: kind: {}, name: {}", kind, name);
                    Ok(LookupResponse::Records(this.find_by_backend_name(kind, &name)))
                }
                LookupRequest::GetByRecordId { kind, record_id } => {
                    #[cfg(feature = "hostscope_tracing")]
                    debug!("[lookup] GetByRecordId: kind: {}, record_id: {}", kind, record_id);
                    Ok(LookupResponse::Record(this.get_by_record_id(kind, &record_id)))
                }
            }
        })
    }
}
