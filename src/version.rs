//! pubtest version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time. Prefer this
//! constant over repeating `env!("CARGO_PKG_VERSION")`.

/// The pubtest version string (for example, `0.3.1`).
pub const PUBTEST_VERSION: &str = env!("CARGO_PKG_VERSION");
