//! Removal of generated optimizer files.
//!
//! [`CleanupGuard`] owns the paths generated during a run and deletes them when dropped, so the
//! files disappear on success, on failure, and on early return alike. Only paths carrying the
//! optimizer basename marker are ever deleted.

use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};

use crate::optimize::is_optimizer_path;

/// What a cleanup pass did with each tracked path.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub removed: Vec<PathBuf>,
    /// Paths without the optimizer marker; left untouched
    pub refused: Vec<PathBuf>,
    /// Paths that were already gone
    pub missing: Vec<PathBuf>,
}

/// Delete every path that carries the optimizer marker.
pub fn remove_optimizer_files<'a>(paths: impl IntoIterator<Item = &'a Path>) -> CleanupSummary {
    let mut summary = CleanupSummary::default();
    for path in paths {
        if !is_optimizer_path(path) {
            tracing::warn!(path = %path.display(), "refusing to delete a file that was not generated");
            summary.refused.push(path.to_path_buf());
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => summary.removed.push(path.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => summary.missing.push(path.to_path_buf()),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove optimizer file"),
        }
    }
    tracing::debug!(removed = summary.removed.len(), "cleaned up optimizer files");
    summary
}

/// Scoped owner of the optimizer files generated during one run.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path for removal; registering the same path twice is a no-op.
    pub fn track(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove the tracked files now and report what happened.
    pub fn finish(mut self) -> CleanupSummary {
        let paths = mem::take(&mut self.paths);
        remove_optimizer_files(paths.iter().map(PathBuf::as_path))
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            let paths = mem::take(&mut self.paths);
            remove_optimizer_files(paths.iter().map(PathBuf::as_path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn only_marked_paths_are_removed() {
        let tmp = TempDir::new().unwrap();
        let generated = tmp.path().join(".test_optimizer.dart");
        let user = tmp.path().join("widget_test.dart");
        fs::write(&generated, "").unwrap();
        fs::write(&user, "").unwrap();

        let summary = remove_optimizer_files([generated.as_path(), user.as_path()]);

        assert!(!generated.exists());
        assert!(user.exists());
        assert_eq!(summary.removed, vec![generated]);
        assert_eq!(summary.refused, vec![user]);
    }

    #[test]
    fn already_missing_files_are_reported() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join(".test_optimizer.live.dart");
        let summary = remove_optimizer_files([gone.as_path()]);
        assert_eq!(summary.missing, vec![gone]);
    }

    #[test]
    fn dropping_the_guard_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let generated = tmp.path().join(".test_optimizer.dart");
        fs::write(&generated, "").unwrap();
        {
            let mut guard = CleanupGuard::new();
            guard.track(generated.clone());
            guard.track(generated.clone());
            assert_eq!(guard.tracked().len(), 1);
        }
        assert!(!generated.exists());
    }

    #[test]
    fn guard_cleans_up_on_panic() {
        let tmp = TempDir::new().unwrap();
        let generated = tmp.path().join(".test_optimizer.dart");
        fs::write(&generated, "").unwrap();

        let path = generated.clone();
        let result = std::panic::catch_unwind(move || {
            let mut guard = CleanupGuard::new();
            guard.track(path);
            panic!("run aborted");
        });

        assert!(result.is_err());
        assert!(!generated.exists());
    }
}
