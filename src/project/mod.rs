//! Package discovery and toolchain classification
//!
//! ## Modules
//!
//! - `pubspec` - Manifest/lockfile reading (`pubspec.yaml`, `pubspec.lock`)
//! - `resolve` - Test directory resolution with toolchain filtering
//!
//! ## Design
//!
//! Locating manifests and classifying them are abstracted via the [`ProjectLocator`] and
//! [`ProjectClassifier`] traits so resolution can be exercised against in-memory fakes.
//! Default implementations read `pubspec.yaml` files from disk.

pub mod pubspec;
pub mod resolve;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pubtest_core::ToolchainKind;

use crate::errors::TestResult;

pub use pubspec::{PubspecClassifier, PubspecLocator, RunnerTokens};
pub use resolve::TestDirectoryResolver;

/// Test targets (test directories or optimizer files) and the toolchain that runs them.
///
/// Ordered by path so command order is stable across runs.
pub type TestTargets = BTreeMap<PathBuf, ToolchainKind>;

/// Find package manifests on disk.
pub trait ProjectLocator {
    /// Return the manifest of the package containing `dir`, walking upward.
    fn nearest(&self, dir: &Path) -> Option<PathBuf>;

    /// Return every manifest below `dir` (sub-packages), sorted.
    fn descendants(&self, dir: &Path) -> TestResult<Vec<PathBuf>>;
}

/// Decide which toolchain a package is tested with.
pub trait ProjectClassifier {
    fn classify(&self, manifest: &Path) -> TestResult<ToolchainKind>;
}

/// Collect the manifests a run covers: the nearest one, plus sub-packages when `recursive`.
pub fn collect_manifests(locator: &dyn ProjectLocator, dir: &Path, recursive: bool) -> TestResult<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    if let Some(nearest) = locator.nearest(dir) {
        manifests.push(nearest);
    }
    if recursive {
        for manifest in locator.descendants(dir)? {
            if !manifests.contains(&manifest) {
                manifests.push(manifest);
            }
        }
    }
    tracing::debug!(count = manifests.len(), recursive, "collected manifests");
    Ok(manifests)
}
