//! Integration test infrastructure for the network fabric service managers
//!
//! Provides:
//! - Fabric and tenant intent fixtures
//! - Observed device state builders, healthy by default
//! - Plan and test-result verification helpers
//! - Test logging setup

pub mod fixtures;
mod verification;

pub use fixtures::*;
pub use verification::*;

use tracing_subscriber::EnvFilter;

/// Routes tracing output through the test harness.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
