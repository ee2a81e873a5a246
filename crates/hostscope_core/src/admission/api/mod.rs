//! External-facing APIs of the admission layer.
//!
//! - **Admission**: run by the control plane on resource creation, update and deletion
//! - **Lookup**: read-only record queries the admission layer issues to the storage layer

pub mod admission;
pub mod types;

// Re-export all types for convenience
pub use types::*;
