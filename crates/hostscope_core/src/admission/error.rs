use thiserror::Error;

use crate::admission::infrastructure::resource::ResourceKind;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AdmissionError {
    #[error("Admission error, internal hostscope API error")]
    InternalError,

    #[error("Admission error, {0} {1} has no owning host")]
    MissingOwner(ResourceKind, String),

    #[error("Admission error, {kind} {name} has an empty {referent_kind} reference")]
    EmptyReferenceName { kind: ResourceKind, name: String, referent_kind: ResourceKind },

    #[error(
        "Admission error, {referent_kind} {referent} is owned by {referent_owner}, but {referrer_kind} {referrer} is owned by {owner}; referenced resources must live on the same host"
    )]
    CrossHostReference {
        referrer_kind: ResourceKind,
        referrer: String,
        referent_kind: ResourceKind,
        referent: String,
        owner: String,
        referent_owner: String,
    },

    #[error("Admission error, record lookup failed ({0})")]
    LookupFailure(String),

    #[error("Admission error, invalid record identifier ({0:?})")]
    InvalidRecordId(String),
}

impl AdmissionError {
    /// Normalizes an error raised by a lookup capability.
    ///
    /// Lookups may fail for reasons that have nothing to do with the resource
    /// under validation, so every such error is reported as a lookup failure
    /// rather than as a verdict.
    pub(crate) fn into_lookup_failure(self) -> Self {
        match self {
            failure @ AdmissionError::LookupFailure(_) => failure,
            other => AdmissionError::LookupFailure(other.to_string()),
        }
    }

    /// Returns true for errors that reject the resource itself, as opposed to
    /// errors of the admission machinery.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AdmissionError::MissingOwner(..)
                | AdmissionError::EmptyReferenceName { .. }
                | AdmissionError::CrossHostReference { .. }
                | AdmissionError::InvalidRecordId(_)
        )
    }
}
