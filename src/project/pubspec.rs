//! `pubspec.yaml` / `pubspec.lock` reading.
//!
//! Only the fields needed for classification are deserialized; everything else in the manifest is
//! ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use pubtest_core::ToolchainKind;
use pubtest_core::conventions::{FVM_MARKERS, LOCKFILE_FILE, MANIFEST_FILE};
use serde::Deserialize;

use super::{ProjectClassifier, ProjectLocator};
use crate::errors::{TestError, TestResult};

/// Packages whose presence marks a Flutter project.
const FLUTTER_SDK_PACKAGES: [&str; 2] = ["flutter", "flutter_test"];

/// Directories never searched for sub-packages.
const SKIPPED_DIRS: [&str; 1] = ["build"];

#[derive(Debug, Deserialize)]
struct Pubspec {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_yaml_ng::Value>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, serde_yaml_ng::Value>>,
}

impl Pubspec {
    fn depends_on_flutter(&self) -> bool {
        [&self.dependencies, &self.dev_dependencies]
            .into_iter()
            .flatten()
            .any(|deps| FLUTTER_SDK_PACKAGES.iter().any(|name| deps.contains_key(*name)))
    }
}

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    packages: Option<BTreeMap<String, LockedPackage>>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    #[serde(default)]
    source: Option<String>,
}

impl Lockfile {
    fn pins_flutter_sdk(&self) -> bool {
        self.packages.as_ref().is_some_and(|packages| {
            FLUTTER_SDK_PACKAGES.iter().any(|name| {
                packages
                    .get(*name)
                    .is_some_and(|pkg| pkg.source.as_deref() == Some("sdk"))
            })
        })
    }
}

/// Filesystem-backed manifest discovery.
#[derive(Debug, Default, Clone, Copy)]
pub struct PubspecLocator;

impl ProjectLocator for PubspecLocator {
    fn nearest(&self, dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|ancestor| ancestor.join(MANIFEST_FILE))
            .find(|candidate| candidate.is_file())
    }

    fn descendants(&self, dir: &Path) -> TestResult<Vec<PathBuf>> {
        let root = dir.to_str().ok_or_else(|| TestError::Pattern {
            pattern: dir.display().to_string(),
            message: "path is not valid UTF-8".to_string(),
        })?;
        let pattern = format!("{}/**/{MANIFEST_FILE}", glob::Pattern::escape(root));
        let entries = glob::glob(&pattern).map_err(|e| TestError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut manifests: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable path");
                    None
                }
            })
            .filter(|path| !is_skipped(dir, path))
            .collect();
        manifests.sort();
        Ok(manifests)
    }
}

/// Check whether a manifest lives under a hidden or build directory below `root`.
fn is_skipped(root: &Path, manifest: &Path) -> bool {
    let Ok(relative) = manifest.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
        }
        _ => false,
    })
}

/// Classifies packages by their manifest dependencies and lockfile pins.
#[derive(Debug, Default, Clone, Copy)]
pub struct PubspecClassifier;

impl PubspecClassifier {
    fn read_manifest(path: &Path) -> TestResult<Pubspec> {
        let source = fs::read_to_string(path).map_err(|e| TestError::filesystem("read", path, e))?;
        serde_yaml_ng::from_str(&source).map_err(|e| TestError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read the lockfile next to a manifest; a missing or unparseable lockfile is ignored.
    fn read_lockfile(manifest: &Path) -> Option<Lockfile> {
        let path = manifest.with_file_name(LOCKFILE_FILE);
        let source = fs::read_to_string(&path).ok()?;
        match serde_yaml_ng::from_str(&source) {
            Ok(lock) => Some(lock),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable lockfile");
                None
            }
        }
    }
}

impl ProjectClassifier for PubspecClassifier {
    fn classify(&self, manifest: &Path) -> TestResult<ToolchainKind> {
        let pubspec = Self::read_manifest(manifest)?;
        let flutter =
            pubspec.depends_on_flutter() || Self::read_lockfile(manifest).is_some_and(|lock| lock.pins_flutter_sdk());
        let kind = if flutter { ToolchainKind::Flutter } else { ToolchainKind::Dart };
        tracing::debug!(
            package = pubspec.name.as_deref().unwrap_or("<unnamed>"),
            toolchain = %kind,
            "classified package"
        );
        Ok(kind)
    }
}

/// Invocation tokens for each toolchain (`dart`, `fvm flutter`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerTokens {
    pub dart: String,
    pub flutter: String,
}

impl Default for RunnerTokens {
    fn default() -> Self {
        Self {
            dart: ToolchainKind::Dart.executable().to_string(),
            flutter: ToolchainKind::Flutter.executable().to_string(),
        }
    }
}

impl RunnerTokens {
    /// Route both toolchains through `fvm` when `dir` or an ancestor pins an FVM version.
    pub fn detect(dir: &Path) -> Self {
        let pinned = dir
            .ancestors()
            .any(|ancestor| FVM_MARKERS.iter().any(|marker| ancestor.join(marker).exists()));
        if pinned {
            tracing::debug!(dir = %dir.display(), "using fvm-managed toolchains");
            Self {
                dart: "fvm dart".to_string(),
                flutter: "fvm flutter".to_string(),
            }
        } else {
            Self::default()
        }
    }

    pub fn for_kind(&self, kind: ToolchainKind) -> &str {
        match kind {
            ToolchainKind::Dart => &self.dart,
            ToolchainKind::Flutter => &self.flutter,
        }
    }
}
