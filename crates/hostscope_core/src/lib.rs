//! Host-scoped naming and admission for multi-host virtualization resources.
//!
//! Resources such as domains, volumes, pools and boot disks are declared against
//! one backend host each, but are stored as records in a single shared namespace.
//! This crate provides the two pieces of logic needed to keep that namespace sound:
//!
//! - a deterministic, length-bounded record identifier generator that folds the
//!   owning host into the identifier according to a deployment-wide strategy,
//! - a read-only reference validator that rejects resources referring to records
//!   owned by another host.
//!
//! Both are wired together by the admission service, which is a [`tower`] service
//! parameterized by the lookup capability of the surrounding storage layer.
//!
//! [`tower`]: https://docs.rs/tower

#[cfg(test)]
pub mod tests;

pub mod admission;

#[cfg(feature = "hostscope_tracing")]
pub mod hostscope_tracing {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize tracing for tests
    /// This sets up a tracing subscriber that will display logs during test execution.
    /// Call this at the beginning of tests that need to see tracing output.
    pub fn init() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("off"))
                .unwrap();

            fmt().with_target(false).with_test_writer().with_env_filter(filter).init();
        });
    }
}
