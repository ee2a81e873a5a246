//! Admission API service implementation.
//!
//! This module provides the service run by the control plane before a resource enters the
//! reconciliation pipeline. The `AdmissionApiService` combines:
//! - **Name Generator**: derives (or checks) the record identifier of the resource
//! - **Reference Validator**: rejects references to records owned by another host
//!
//! ## Supported Operations
//!
//! **Create / Update**: compute the record identifier, validate the (new) resource and
//! return the admitted record with its operator metadata.
//!
//! **Delete**: acknowledged without validation.

use std::{future::Future, pin::Pin, task::Poll};

use tower::Service;
#[cfg(feature = "hostscope_tracing")]
use tracing::info;

use crate::admission::{
    api::types::{
        AdmissionRequest, AdmissionResponse, AdmittedRecord, LookupRequest, LookupResponse,
    },
    error::AdmissionError,
    infrastructure::{
        naming::{NameGenerator, NamingStrategy, check_record_id, record_annotations, record_labels},
        resource::Resource,
        validation::ReferenceValidator,
    },
};

/// Admission API Service
///
/// Generic over the lookup capability `L` supplied by the storage layer. Cloning the
/// service clones the lookup handle; no other state is shared between calls.
#[derive(Debug, Clone)]
pub struct AdmissionApiService<L> {
    /// Record identifier generator, fixed for the lifetime of the process
    generator: NameGenerator,
    /// Cross-host reference validator
    validator: ReferenceValidator,
    /// Read access to existing records
    lookup: L,
}

impl<L> AdmissionApiService<L> {
    /// Creates a new admission service naming records with `strategy`
    pub fn new(strategy: NamingStrategy, lookup: L) -> Self {
        Self { generator: NameGenerator::new(strategy), validator: ReferenceValidator, lookup }
    }

    /// Returns the naming strategy of this service
    pub fn strategy(&self) -> NamingStrategy {
        self.generator.strategy()
    }
}

/// Computes the record identifier of `resource`, then validates it.
///
/// A resource without owner is rejected before any identifier is derived or checked.
async fn admit<L>(
    generator: NameGenerator,
    validator: &ReferenceValidator,
    lookup: &mut L,
    resource: Resource,
) -> Result<AdmissionResponse, AdmissionError>
where
    L: Service<LookupRequest, Response = LookupResponse, Error = AdmissionError>,
{
    let Some(owner) = resource.owner() else {
        return Err(AdmissionError::MissingOwner(
            resource.kind(),
            resource.backend_name().to_string(),
        ));
    };

    let record_id = match resource.record_id() {
        Some(record_id) => record_id.to_string(),
        None => generator.generate(resource.backend_name(), owner),
    };
    check_record_id(&record_id)?;

    validator.validate(&resource, lookup).await?;

    Ok(AdmissionResponse::Admitted(AdmittedRecord {
        labels: record_labels(owner),
        annotations: record_annotations(resource.backend_name()),
        record_id,
    }))
}

impl<L> Service<AdmissionRequest> for AdmissionApiService<L>
where
    L: Service<LookupRequest, Response = LookupResponse, Error = AdmissionError>
        + Clone
        + Send
        + 'static,
    L::Future: Send,
{
    type Response = AdmissionResponse;
    type Error = AdmissionError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: AdmissionRequest) -> Self::Future {
        let generator = self.generator;
        let validator = self.validator.clone();
        let mut lookup = self.lookup.clone();
        Box::pin(async move {
            match request {
                AdmissionRequest::Create(resource) => {
                    #[cfg(feature = "hostscope_tracing")]
                    info!("[admission-{}] Create: {}", generator.strategy(), resource);
                    let response = admit(generator, &validator, &mut lookup, resource).await;
                    #[cfg(feature = "hostscope_tracing")]
                    info!("[admission-{}] Create: verdict: {:?}", generator.strategy(), response);
                    response
                }
                AdmissionRequest::Update { old, new } => {
                    #[cfg(feature = "hostscope_tracing")]
                    info!("[admission-{}] Update: {} -> {}", generator.strategy(), old, new);
                    #[cfg(not(feature = "hostscope_tracing"))]
                    let _ = old;
                    let response = admit(generator, &validator, &mut lookup, new).await;
                    #[cfg(feature = "hostscope_tracing")]
                    info!("[admission-{}] Update: verdict: {:?}", generator.strategy(), response);
                    response
                }
                AdmissionRequest::Delete(resource) => {
                    #[cfg(feature = "hostscope_tracing")]
                    info!("[admission-{}] Delete: {}", generator.strategy(), resource);
                    #[cfg(not(feature = "hostscope_tracing"))]
                    let _ = resource;
                    Ok(AdmissionResponse::Ack)
                }
            }
        })
    }
}
