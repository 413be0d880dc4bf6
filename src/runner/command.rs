//! Command construction from resolved test targets.

use std::path::{Component, Path, PathBuf};

use pubtest_core::ToolchainKind;
use pubtest_core::conventions::{LIB_DIR, TEST_DIR};

use super::CommandDescriptor;
use crate::project::{RunnerTokens, TestTargets};

/// Extra arguments appended to each toolchain's `test` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainArgs {
    pub dart: Vec<String>,
    pub flutter: Vec<String>,
}

impl ToolchainArgs {
    pub fn for_kind(&self, kind: ToolchainKind) -> &[String] {
        match kind {
            ToolchainKind::Dart => &self.dart,
            ToolchainKind::Flutter => &self.flutter,
        }
    }
}

/// Where runner tokens come from.
#[derive(Debug, Clone, Copy)]
enum RunnerSource<'a> {
    /// The same tokens for every target
    Fixed(&'a RunnerTokens),
    /// Detected from each target's project root, so a package pinned with FVM gets `fvm`
    PerProject,
}

/// Turns test targets into runnable commands.
pub struct CommandBuilder<'a> {
    runners: RunnerSource<'a>,
    invocation_root: &'a Path,
}

impl<'a> CommandBuilder<'a> {
    /// Use `runners` for every target.
    ///
    /// `invocation_root` is the directory the user ran from; labels show paths relative to it.
    pub fn new(runners: &'a RunnerTokens, invocation_root: &'a Path) -> Self {
        Self {
            runners: RunnerSource::Fixed(runners),
            invocation_root,
        }
    }

    /// Detect runner tokens per project with [`RunnerTokens::detect`].
    pub fn detecting(invocation_root: &'a Path) -> Self {
        Self {
            runners: RunnerSource::PerProject,
            invocation_root,
        }
    }

    /// Build one command per target, in target order.
    pub fn build(&self, targets: &TestTargets, args: &ToolchainArgs) -> Vec<CommandDescriptor> {
        targets
            .iter()
            .map(|(path, &kind)| self.build_one(path, kind, args.for_kind(kind)))
            .collect()
    }

    fn build_one(&self, target: &Path, kind: ToolchainKind, args: &[String]) -> CommandDescriptor {
        let root = project_root(target);
        let detected;
        let runners = match self.runners {
            RunnerSource::Fixed(runners) => runners,
            RunnerSource::PerProject => {
                detected = RunnerTokens::detect(&root);
                &detected
            }
        };
        let runner = runners.for_kind(kind);

        let relative = if root.as_os_str() == "." {
            target
        } else {
            target.strip_prefix(&root).unwrap_or(target)
        };

        // The runner token may be several words (`fvm flutter`); everything after it is quoted.
        let mut command = format!("{runner} test {}", shell_escape::escape(relative.to_string_lossy()));
        for arg in args {
            command.push(' ');
            command.push_str(&shell_escape::escape(arg.as_str().into()));
        }

        let shown = target.strip_prefix(self.invocation_root).unwrap_or(target);
        let label = format!("Running ({runner}) tests in {}", project_root(shown).display());

        tracing::debug!(command = %command, workdir = %root.display(), "built command");
        CommandDescriptor {
            command,
            workdir: root,
            keys: None,
            label,
        }
    }
}

/// Derive the package root a test target belongs to.
///
/// Everything above the innermost `test` segment, else above the innermost `lib` segment, else the
/// target's parent directory. An empty result becomes `.`.
pub fn project_root(target: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = target.components().collect();
    let anchor = |name: &str| {
        components
            .iter()
            .rposition(|c| matches!(c, Component::Normal(segment) if *segment == name))
    };

    let root: PathBuf = match anchor(TEST_DIR).or_else(|| anchor(LIB_DIR)) {
        Some(index) => components[..index].iter().collect(),
        None => target.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_args() -> ToolchainArgs {
        ToolchainArgs {
            dart: vec!["--x".to_string()],
            flutter: vec!["--no-pub".to_string(), "--coverage".to_string()],
        }
    }

    #[test]
    fn root_is_above_test_segment() {
        assert_eq!(
            project_root(Path::new("/work/pkgA/test/foo_test.dart")),
            PathBuf::from("/work/pkgA")
        );
        assert_eq!(project_root(Path::new("/work/pkgA/test")), PathBuf::from("/work/pkgA"));
    }

    #[test]
    fn innermost_test_segment_wins() {
        assert_eq!(
            project_root(Path::new("/test/packages/ui/test/.test_optimizer.dart")),
            PathBuf::from("/test/packages/ui")
        );
    }

    #[test]
    fn lib_segment_is_the_fallback() {
        assert_eq!(project_root(Path::new("/work/pkgB/lib/src/a.dart")), PathBuf::from("/work/pkgB"));
    }

    #[test]
    fn parent_is_the_last_resort() {
        assert_eq!(project_root(Path::new("/work/pkgC/main.dart")), PathBuf::from("/work/pkgC"));
        assert_eq!(project_root(Path::new("test")), PathBuf::from("."));
        assert_eq!(project_root(Path::new("main.dart")), PathBuf::from("."));
    }

    #[test]
    fn dart_command_is_relative_to_package() {
        let runners = RunnerTokens::default();
        let root = Path::new("/work");
        let targets = TestTargets::from([(PathBuf::from("/work/pkgA/test/foo_test.dart"), ToolchainKind::Dart)]);

        let commands = CommandBuilder::new(&runners, root).build(&targets, &builder_args());
        assert_eq!(commands.len(), 1);
        let command = &commands[0];
        assert_eq!(command.command, "dart test test/foo_test.dart --x");
        assert!(command.command.ends_with("foo_test.dart --x"));
        assert_eq!(command.workdir, PathBuf::from("/work/pkgA"));
        assert_eq!(command.label, "Running (dart) tests in pkgA");
        assert_eq!(command.keys, None);
    }

    #[test]
    fn args_are_quoted_for_the_shell() {
        let runners = RunnerTokens::default();
        let root = Path::new("/work");
        let targets = TestTargets::from([(PathBuf::from("/work/pkgA/test/my tests_test.dart"), ToolchainKind::Dart)]);
        let args = ToolchainArgs {
            dart: vec!["--name".to_string(), "login flow|x".to_string(), "--tags=$HOME".to_string()],
            flutter: Vec::new(),
        };

        let commands = CommandBuilder::new(&runners, root).build(&targets, &args);
        assert_eq!(
            commands[0].command,
            "dart test 'test/my tests_test.dart' --name 'login flow|x' '--tags=$HOME'"
        );
    }

    #[test]
    fn detecting_builder_uses_fvm_only_for_pinned_packages() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pinned = tmp.path().join("apps/ui");
        let plain = tmp.path().join("apps/core");
        std::fs::create_dir_all(pinned.join("test")).unwrap();
        std::fs::create_dir_all(plain.join("test")).unwrap();
        std::fs::write(pinned.join(".fvmrc"), "{\"flutter\": \"3.22.0\"}").unwrap();

        let targets = TestTargets::from([
            (pinned.join("test"), ToolchainKind::Flutter),
            (plain.join("test"), ToolchainKind::Dart),
        ]);
        let commands = CommandBuilder::detecting(tmp.path()).build(&targets, &ToolchainArgs::default());

        let by_dir = |dir: &Path| commands.iter().find(|c| c.workdir == dir).unwrap().command.clone();
        assert_eq!(by_dir(&pinned), "fvm flutter test test");
        assert_eq!(by_dir(&plain), "dart test test");
    }

    #[test]
    fn flutter_targets_use_flutter_args_and_runner() {
        let runners = RunnerTokens {
            dart: "fvm dart".to_string(),
            flutter: "fvm flutter".to_string(),
        };
        let root = Path::new("/work");
        let targets = TestTargets::from([
            (PathBuf::from("/work/apps/ui/test"), ToolchainKind::Flutter),
            (PathBuf::from("/work/test"), ToolchainKind::Dart),
        ]);

        let commands = CommandBuilder::new(&runners, root).build(&targets, &builder_args());
        assert_eq!(commands[0].command, "fvm flutter test test --no-pub --coverage");
        assert_eq!(commands[0].label, "Running (fvm flutter) tests in apps/ui");
        assert_eq!(commands[1].command, "fvm dart test test --x");
        assert_eq!(commands[1].workdir, PathBuf::from("/work"));
        assert_eq!(commands[1].label, "Running (fvm dart) tests in .");
    }
}
