//! Services backing the admission layer.
//!
//! - **Lookup**: in-memory record index implementing the lookup capability

pub mod lookup;
