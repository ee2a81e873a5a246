//! Cross-host reference validation.
//!
//! This module rejects resources that reference a record owned by another backend host.
//! A domain booting from a cloud-init disk declared on host B, while the domain itself is
//! declared on host A, cannot be reconciled: neither host can see both resources.
//!
//! ## Validation Rules
//!
//! **Owner**: every resource must declare a non-empty owning-host identifier.
//!
//! **Empty references**: a reference field that is present but empty is rejected.
//!
//! **Dangling references**: a reference that matches no record is accepted, as the referent
//! may exist on the backend host only.
//!
//! **Mismatched references**: a reference that matches a record declaring another owner is
//! rejected. When several records match, every one of them must share the owner.
//!
//! Raw storage paths (disk volume identifiers, base volume identifiers) are opaque to the
//! control plane and are never checked.
//!
//! ## Lookup
//!
//! Records are read through an injected lookup service. The validator keeps no state and
//! never retries: lookup errors are surfaced as [`AdmissionError::LookupFailure`], leaving
//! retry and timeout policy to the caller.

use tower::{Service, ServiceExt};
#[cfg(feature = "hostscope_tracing")]
use tracing::debug;

use crate::admission::{
    api::types::{LookupRecord, LookupRequest, LookupResponse},
    error::AdmissionError,
    infrastructure::resource::{Reference, ResolveBy, Resource},
};

/// Placeholder naming the owner of records that do not declare one.
const UNSET_OWNER: &str = "<unset>";

/// Cross-host reference validator.
///
/// Stateless and reentrant: any number of validations may run concurrently, and running
/// the same validation twice against unchanged records yields the same verdict.
#[derive(Debug, Clone, Default)]
pub struct ReferenceValidator;

impl ReferenceValidator {
    /// Validates every reference carried by `resource`.
    ///
    /// # Errors
    /// * `MissingOwner` - the resource declares no owning host
    /// * `EmptyReferenceName` - a reference field is present but empty
    /// * `CrossHostReference` - a referenced record is owned by another host
    /// * `LookupFailure` - the lookup service failed
    pub async fn validate<L>(
        &self,
        resource: &Resource,
        lookup: &mut L,
    ) -> Result<(), AdmissionError>
    where
        L: Service<LookupRequest, Response = LookupResponse, Error = AdmissionError>,
    {
        let Some(owner) = resource.owner() else {
            return Err(AdmissionError::MissingOwner(
                resource.kind(),
                resource.backend_name().to_string(),
            ));
        };

        for (field, value) in resource.opaque_fields() {
            #[cfg(feature = "hostscope_tracing")]
            debug!(
                "[validator] {}: {} references raw path {}, not checked",
                resource, field, value
            );
            #[cfg(not(feature = "hostscope_tracing"))]
            let _ = (field, value);
        }

        for reference in resource.references() {
            if reference.name.is_empty() {
                return Err(AdmissionError::EmptyReferenceName {
                    kind: resource.kind(),
                    name: resource.backend_name().to_string(),
                    referent_kind: reference.kind,
                });
            }

            let candidates = Self::resolve(&reference, lookup).await?;
            #[cfg(feature = "hostscope_tracing")]
            debug!(
                "[validator] {}: {} {} resolved to {} record(s)",
                resource,
                reference.kind,
                reference.name,
                candidates.len()
            );

            if let Some(divergent) = candidates.iter().find(|c| c.owner_or_empty() != owner) {
                return Err(AdmissionError::CrossHostReference {
                    referrer_kind: resource.kind(),
                    referrer: resource.backend_name().to_string(),
                    referent_kind: reference.kind,
                    referent: reference.name.to_string(),
                    owner: owner.to_string(),
                    referent_owner: divergent
                        .owner
                        .clone()
                        .filter(|owner| !owner.is_empty())
                        .unwrap_or_else(|| UNSET_OWNER.to_string()),
                });
            }
        }

        Ok(())
    }

    /// Fetches the records matching `reference`.
    ///
    /// Candidates are filtered again on kind (and backend name for by-name references)
    /// so that a lookup answering with a broader set cannot cause false rejections.
    async fn resolve<L>(
        reference: &Reference<'_>,
        lookup: &mut L,
    ) -> Result<Vec<LookupRecord>, AdmissionError>
    where
        L: Service<LookupRequest, Response = LookupResponse, Error = AdmissionError>,
    {
        let request = match reference.by {
            ResolveBy::RecordId => LookupRequest::GetByRecordId {
                kind: reference.kind,
                record_id: reference.name.to_string(),
            },
            ResolveBy::BackendName => LookupRequest::FindByBackendName {
                kind: reference.kind,
                name: reference.name.to_string(),
            },
        };

        let response = lookup
            .ready()
            .await
            .map_err(AdmissionError::into_lookup_failure)?
            .call(request)
            .await
            .map_err(AdmissionError::into_lookup_failure)?;

        match (reference.by, response) {
            (ResolveBy::RecordId, LookupResponse::Record(record)) => {
                Ok(record.into_iter().filter(|record| record.kind == reference.kind).collect())
            }
            (ResolveBy::BackendName, LookupResponse::Records(records)) => Ok(records
                .into_iter()
                .filter(|record| {
                    record.kind == reference.kind
                        && record.backend_name.as_deref() == Some(reference.name)
                })
                .collect()),
            _ => Err(AdmissionError::LookupFailure(format!(
                "unexpected response while resolving {} {}",
                reference.kind, reference.name
            ))),
        }
    }
}
