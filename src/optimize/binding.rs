//! Test file sub-type detection.
//!
//! Flutter test files that install a custom `*TestWidgetsFlutterBinding` cannot share a process
//! with files using a different binding, so each binding kind gets its own optimizer file.

use std::sync::LazyLock;

use pubtest_core::conventions::{BINDING_SUFFIX, binding_label};
use regex::Regex;

/// Derive a sub-type label from a test file's source text.
///
/// Returning `None` means "no specialised marker"; the caller falls back to the toolchain default.
pub trait ContentClassifier {
    fn classify(&self, source: &str) -> Option<String>;
}

#[allow(clippy::expect_used)]
static BINDING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(\w*){BINDING_SUFFIX}\b")).expect("INVARIANT: binding pattern is a valid regex")
});

/// Detects the first `<Prefix>TestWidgetsFlutterBinding` reference in a file.
#[derive(Debug, Default, Clone, Copy)]
pub struct BindingClassifier;

impl ContentClassifier for BindingClassifier {
    fn classify(&self, source: &str) -> Option<String> {
        let captures = BINDING_PATTERN.captures(source)?;
        let prefix = captures.get(1).map_or("", |m| m.as_str());
        Some(binding_label(prefix))
    }
}
