//! Admission module.
//!
//! This module decides whether a host-scoped resource may enter the control plane and
//! under which record identifier.
//!
//! ## Core Architecture
//!
//! ### Name Generator
//! Pure function from (backend name, owning host, strategy) to a record identifier that is
//! lowercase, DNS-label shaped and at most 63 bytes long. The strategy is a deployment-wide
//! setting parsed once at startup.
//!
//! ### Reference Validator
//! Read-only check that every record referenced by a resource belongs to the same owning
//! host. Records are read through an injected lookup service.
//!
//! ### Admission API
//! Tower service combining both for create, update and delete requests.
//!
//! ## Default Service Stack
//!
//! `AdmissionApiDefaultStack` pairs the admission service with the in-memory
//! [`services::lookup::RecordIndex`]. Production deployments plug an adapter over their
//! storage layer into [`api::admission::AdmissionApiService`] instead.
pub mod api;
pub mod error;
pub mod infrastructure;
pub mod services;

use crate::admission::infrastructure::naming::NamingStrategy;

/// Admission API service backed by the in-memory record index.
pub type AdmissionApiDefaultStack =
    api::admission::AdmissionApiService<services::lookup::RecordIndex>;

/// Initialize an admission service backed by an empty in-memory record index.
///
/// # Arguments
/// * `strategy` - Naming strategy applied to every admitted resource
///
/// # Returns
/// A tuple containing (admission service, record index handle). Records inserted through
/// the handle are visible to subsequent admissions.
pub fn init_admission(
    strategy: NamingStrategy,
) -> (AdmissionApiDefaultStack, services::lookup::RecordIndex) {
    let index = services::lookup::RecordIndex::default();
    (api::admission::AdmissionApiService::new(strategy, index.clone()), index)
}
