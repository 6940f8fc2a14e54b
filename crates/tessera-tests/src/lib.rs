//! Integration test infrastructure for Tessera.
//!
//! Provides deterministic signing keys, license fixtures and helpers for
//! writing license files to temporary directories.
//!
//! # Usage
//!
//! ```ignore
//! use tessera_tests::{LicenseFixture, TestIssuer};
//!
//! let issuer = TestIssuer::primary();
//! let artifact = issuer.issue(&LicenseFixture::active());
//! ```

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tessera_licensing=debug")),
        )
        .with_test_writer()
        .try_init();
}
