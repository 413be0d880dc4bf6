//! Shared user-facing messages.
//!
//! Kept here so the CLI and its tests agree on the exact wording.

use crate::ToolchainFilter;

/// Build the message shown when a run finds nothing to execute.
///
/// ## Examples
/// ```rust
/// use pubtest_core::ToolchainFilter;
/// use pubtest_core::errors::no_tests_message;
///
/// assert_eq!(no_tests_message(ToolchainFilter::DartOnly), "No dart tests found");
/// assert_eq!(no_tests_message(ToolchainFilter::Both), "No tests found");
/// ```
pub fn no_tests_message(filter: ToolchainFilter) -> String {
    match filter.narrowed() {
        Some(kind) => format!("No {kind} tests found"),
        None => "No tests found".to_string(),
    }
}
