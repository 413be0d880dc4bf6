//! Provide the shared, pure vocabulary used by the `pubtest` orchestrator.
//!
//! This crate is intentionally small and dependency-free. It contains:
//! - the two test toolchains (`dart`, `flutter`) and the filter a user selects between them,
//! - the file and directory naming conventions the orchestrator relies on,
//! - the exit-code reduction policy used to fold many command results into one status.
//!
//! ## Notes
//!
//! - **No IO** lives here. Filesystem, manifest, and process concerns belong to the `pubtest` crate.

pub mod conventions;
pub mod errors;
pub mod exit;

use std::fmt;

/// Identify the test toolchain a package is run with.
///
/// Dart is the generic kind: every package can run `dart test`, so a package is only classified as
/// Flutter when it depends on the Flutter SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolchainKind {
    Dart,
    Flutter,
}

impl ToolchainKind {
    /// Return the executable name used to invoke this toolchain.
    pub fn executable(self) -> &'static str {
        match self {
            ToolchainKind::Dart => "dart",
            ToolchainKind::Flutter => "flutter",
        }
    }

    /// Return the sub-type label whose optimizer file uses the bare basename.
    pub fn default_label(self) -> &'static str {
        match self {
            ToolchainKind::Dart => conventions::DART_LABEL,
            ToolchainKind::Flutter => conventions::FLUTTER_LABEL,
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// Restrict which toolchains a run includes.
///
/// `Both` is what the user gets when neither `--dart-only` nor `--flutter-only` is passed, and
/// also when both are passed: requesting both is the same as not filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolchainFilter {
    #[default]
    Both,
    DartOnly,
    FlutterOnly,
}

impl ToolchainFilter {
    /// Build a filter from the two CLI flags.
    ///
    /// ## Examples
    /// ```rust
    /// use pubtest_core::ToolchainFilter;
    ///
    /// assert_eq!(ToolchainFilter::from_flags(true, false), ToolchainFilter::DartOnly);
    /// assert_eq!(ToolchainFilter::from_flags(true, true), ToolchainFilter::Both);
    /// ```
    pub fn from_flags(dart_only: bool, flutter_only: bool) -> Self {
        match (dart_only, flutter_only) {
            (true, false) => ToolchainFilter::DartOnly,
            (false, true) => ToolchainFilter::FlutterOnly,
            _ => ToolchainFilter::Both,
        }
    }

    /// Check whether a package of the given toolchain survives this filter.
    pub fn includes(self, kind: ToolchainKind) -> bool {
        match self {
            ToolchainFilter::Both => true,
            ToolchainFilter::DartOnly => kind != ToolchainKind::Flutter,
            ToolchainFilter::FlutterOnly => kind != ToolchainKind::Dart,
        }
    }

    /// Return the single toolchain this filter narrows to, if any.
    pub fn narrowed(self) -> Option<ToolchainKind> {
        match self {
            ToolchainFilter::Both => None,
            ToolchainFilter::DartOnly => Some(ToolchainKind::Dart),
            ToolchainFilter::FlutterOnly => Some(ToolchainKind::Flutter),
        }
    }
}
