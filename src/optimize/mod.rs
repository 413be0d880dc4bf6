//! Test optimization: many `*_test.dart` files, one process.
//!
//! Starting `dart test` / `flutter test` is expensive, and each test file otherwise pays that cost
//! on its own. The aggregator rewrites every test directory into one generated entry point per
//! sub-type group, and the runner then executes those entry points instead of the directory.
//!
//! ## Modules
//!
//! - `binding` - Sub-type detection from file contents ([`ContentClassifier`])
//! - `template` - Generated file content
//!
//! ## Invariants
//!
//! - Generated files always contain [`OPTIMIZER_BASENAME`] in their name, and files carrying that
//!   marker are never collected as tests, so re-running the aggregator over its own output is a no-op.
//! - Every collected test file lands in exactly one group.

pub mod binding;
pub mod template;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pubtest_core::ToolchainKind;
use pubtest_core::conventions::{
    DART_EXTENSION, OPTIMIZER_BASENAME, TEST_FILE_SUFFIX, is_optimizer_file, is_test_file, optimizer_file_name,
};

use crate::errors::{TestError, TestResult};
use crate::project::TestTargets;
use crate::runner::cleanup::CleanupGuard;

pub use binding::{BindingClassifier, ContentClassifier};

/// Test files of one directory, grouped by sub-type label.
pub type TestGroups = BTreeMap<String, Vec<PathBuf>>;

/// Writes optimizer files for resolved test directories.
pub struct TestFileAggregator<'a> {
    classifier: &'a dyn ContentClassifier,
}

impl<'a> TestFileAggregator<'a> {
    pub fn new(classifier: &'a dyn ContentClassifier) -> Self {
        Self { classifier }
    }

    /// Generate optimizer files for every directory in `dirs`.
    ///
    /// Each generated path is registered with `cleanup` before it is written, so a failure part way
    /// through still removes what was already created.
    ///
    /// ## Returns
    /// - The generated optimizer paths mapped to their directory's toolchain. Empty when no directory
    ///   held any test file; the caller reports that as "no tests found".
    #[tracing::instrument(skip_all, fields(dirs = dirs.len()))]
    pub fn optimize(&self, dirs: &TestTargets, cleanup: &mut CleanupGuard) -> TestResult<TestTargets> {
        let mut optimized = TestTargets::new();

        for (dir, &kind) in dirs {
            let groups = self.group(dir, kind)?;
            if groups.is_empty() {
                tracing::debug!(dir = %dir.display(), "no test files");
                continue;
            }

            for (label, files) in &groups {
                let path = dir.join(optimizer_file_name(kind, label));
                let refs: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
                cleanup.track(path.clone());
                fs::write(&path, template::render(kind, &refs))
                    .map_err(|e| TestError::filesystem("write", &path, e))?;
                tracing::debug!(path = %path.display(), label = %label, files = files.len(), "wrote optimizer file");
                optimized.insert(path, kind);
            }
        }

        tracing::info!(count = optimized.len(), "generated optimizer files");
        Ok(optimized)
    }

    /// Group the test files of `dir` by sub-type label.
    pub fn group(&self, dir: &Path, kind: ToolchainKind) -> TestResult<TestGroups> {
        let mut groups = TestGroups::new();
        for file in list_test_files(dir)? {
            let label = self.label_for(&file, kind)?;
            groups.entry(label).or_default().push(file);
        }
        Ok(groups)
    }

    fn label_for(&self, file: &Path, kind: ToolchainKind) -> TestResult<String> {
        if kind == ToolchainKind::Dart {
            return Ok(kind.default_label().to_string());
        }
        let source = fs::read_to_string(file).map_err(|e| TestError::filesystem("read", file, e))?;
        Ok(self
            .classifier
            .classify(&source)
            .unwrap_or_else(|| kind.default_label().to_string()))
    }
}

/// List the `*_test.dart` files directly inside `dir`.
///
/// Symlinks and generated optimizer files are skipped.
pub fn list_test_files(dir: &Path) -> TestResult<Vec<PathBuf>> {
    let files = glob_regular_files(dir, &format!("*{TEST_FILE_SUFFIX}"))?;
    Ok(files
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| is_test_file(name) && !is_optimizer_file(name))
        })
        .collect())
}

/// List optimizer files directly inside `dir`, typically left over from an interrupted run.
pub fn list_optimizer_files(dir: &Path) -> TestResult<Vec<PathBuf>> {
    let files = glob_regular_files(dir, &format!("*{OPTIMIZER_BASENAME}*.{DART_EXTENSION}"))?;
    Ok(files.into_iter().filter(|path| is_optimizer_path(path)).collect())
}

/// Glob `pattern` inside `dir` (non-recursive), keeping regular files only, sorted.
fn glob_regular_files(dir: &Path, pattern: &str) -> TestResult<Vec<PathBuf>> {
    let root = dir.to_str().ok_or_else(|| TestError::Pattern {
        pattern: dir.display().to_string(),
        message: "path is not valid UTF-8".to_string(),
    })?;
    let pattern = format!("{}/{pattern}", glob::Pattern::escape(root));
    let entries = glob::glob(&pattern).map_err(|e| TestError::Pattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            TestError::filesystem("list", path, io::Error::from(e))
        })?;
        let metadata = fs::symlink_metadata(&path).map_err(|e| TestError::filesystem("inspect", &path, e))?;
        if metadata.file_type().is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Check whether a path names a generated optimizer file.
pub fn is_optimizer_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_optimizer_file)
}
