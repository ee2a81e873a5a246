//! Infrastructure primitives for the admission layer.
//!
//! This module provides the resource model, the record naming conventions and the
//! cross-host reference validation shared by every admission path.

pub mod naming;
pub mod resource;
pub mod validation;
