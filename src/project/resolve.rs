//! Test directory resolution.

use std::path::{Path, PathBuf};

use pubtest_core::ToolchainFilter;
use pubtest_core::conventions::TEST_DIR;

use super::{ProjectClassifier, ProjectLocator, TestTargets, collect_manifests};
use crate::errors::{TestError, TestResult};

/// Maps package manifests to their test directories, tagged by toolchain.
pub struct TestDirectoryResolver<'a> {
    locator: &'a dyn ProjectLocator,
    classifier: &'a dyn ProjectClassifier,
}

impl<'a> TestDirectoryResolver<'a> {
    pub fn new(locator: &'a dyn ProjectLocator, classifier: &'a dyn ProjectClassifier) -> Self {
        Self { locator, classifier }
    }

    /// Locate manifests from `dir` and resolve their test directories.
    pub fn resolve_from(&self, dir: &Path, recursive: bool, filter: ToolchainFilter) -> TestResult<TestTargets> {
        let manifests = collect_manifests(self.locator, dir, recursive)?;
        self.resolve(&manifests, filter)
    }

    /// Resolve the test directory of each manifest.
    ///
    /// Manifests without a sibling `test/` directory are skipped before classification. When the
    /// result is empty the run has nothing to do and [`TestError::NoTestsFound`] is returned.
    #[tracing::instrument(skip_all, fields(manifests = manifests.len(), filter = ?filter))]
    pub fn resolve(&self, manifests: &[PathBuf], filter: ToolchainFilter) -> TestResult<TestTargets> {
        let mut dirs = TestTargets::new();

        for manifest in manifests {
            let Some(test_dir) = test_dir_of(manifest) else {
                tracing::debug!(manifest = %manifest.display(), "no test directory");
                continue;
            };

            let kind = self.classifier.classify(manifest)?;
            if !filter.includes(kind) {
                tracing::debug!(dir = %test_dir.display(), toolchain = %kind, "excluded by filter");
                continue;
            }

            dirs.insert(test_dir, kind);
        }

        if dirs.is_empty() {
            return Err(TestError::NoTestsFound { filter });
        }
        tracing::info!(count = dirs.len(), "resolved test directories");
        Ok(dirs)
    }
}

/// Return the `test/` directory next to a manifest, if it exists.
pub(crate) fn test_dir_of(manifest: &Path) -> Option<PathBuf> {
    let dir = manifest.parent()?.join(TEST_DIR);
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubtest_core::ToolchainKind;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Classifier answering from a fixed table keyed by package directory name.
    struct FixedClassifier(HashMap<&'static str, ToolchainKind>);

    impl ProjectClassifier for FixedClassifier {
        fn classify(&self, manifest: &Path) -> TestResult<ToolchainKind> {
            let name = manifest.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()).unwrap();
            Ok(self.0[name])
        }
    }

    struct NoLocator;

    impl ProjectLocator for NoLocator {
        fn nearest(&self, _dir: &Path) -> Option<PathBuf> {
            None
        }

        fn descendants(&self, _dir: &Path) -> TestResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    fn package(root: &Path, name: &str, with_tests: bool) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        if with_tests {
            fs::create_dir_all(dir.join(TEST_DIR)).unwrap();
        }
        let manifest = dir.join("pubspec.yaml");
        fs::write(&manifest, format!("name: {name}\n")).unwrap();
        manifest
    }

    fn classifier() -> FixedClassifier {
        FixedClassifier(HashMap::from([
            ("core", ToolchainKind::Dart),
            ("app", ToolchainKind::Flutter),
            ("docs", ToolchainKind::Dart),
        ]))
    }

    #[test]
    fn packages_without_test_dir_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let manifests = vec![package(tmp.path(), "core", true), package(tmp.path(), "docs", false)];
        let classifier = classifier();
        let resolver = TestDirectoryResolver::new(&NoLocator, &classifier);

        let dirs = resolver.resolve(&manifests, ToolchainFilter::Both).unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs.get(&tmp.path().join("core/test")), Some(&ToolchainKind::Dart));
    }

    #[test]
    fn no_test_dirs_at_all_is_no_tests_found() {
        let tmp = TempDir::new().unwrap();
        let manifests = vec![package(tmp.path(), "docs", false)];
        let classifier = classifier();
        let resolver = TestDirectoryResolver::new(&NoLocator, &classifier);

        let err = resolver.resolve(&manifests, ToolchainFilter::Both).unwrap_err();
        assert!(matches!(err, TestError::NoTestsFound { filter: ToolchainFilter::Both }));
    }

    #[test]
    fn filter_excludes_opposite_toolchain() {
        let tmp = TempDir::new().unwrap();
        let manifests = vec![package(tmp.path(), "core", true), package(tmp.path(), "app", true)];
        let classifier = classifier();
        let resolver = TestDirectoryResolver::new(&NoLocator, &classifier);

        let flutter = resolver.resolve(&manifests, ToolchainFilter::FlutterOnly).unwrap();
        assert_eq!(flutter.values().copied().collect::<Vec<_>>(), vec![ToolchainKind::Flutter]);

        let both = resolver.resolve(&manifests, ToolchainFilter::Both).unwrap();
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn filtered_to_nothing_reports_the_filter() {
        let tmp = TempDir::new().unwrap();
        let manifests = vec![package(tmp.path(), "core", true)];
        let classifier = classifier();
        let resolver = TestDirectoryResolver::new(&NoLocator, &classifier);

        let err = resolver.resolve(&manifests, ToolchainFilter::FlutterOnly).unwrap_err();
        assert_eq!(err.to_string(), "No flutter tests found");
    }

    #[test]
    fn no_manifest_located_is_no_tests_found() {
        let tmp = TempDir::new().unwrap();
        let classifier = classifier();
        let resolver = TestDirectoryResolver::new(&NoLocator, &classifier);

        let err = resolver.resolve_from(tmp.path(), true, ToolchainFilter::DartOnly).unwrap_err();
        assert_eq!(err.to_string(), "No dart tests found");
    }
}
