//! Errors raised before any test command runs.
//!
//! Command failures are not errors: the execution engine records them as results and folds them into
//! an exit code. Everything here short-circuits the run instead.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use pubtest_core::ToolchainFilter;
use pubtest_core::errors::no_tests_message;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TestError {
    #[error("{}", no_tests_message(*filter))]
    #[diagnostic(
        code(pubtest::no_tests),
        help("packages are expected to keep `*_test.dart` files in a `test/` directory next to `pubspec.yaml`")
    )]
    NoTestsFound { filter: ToolchainFilter },

    #[error("invalid manifest {}: {message}", path.display())]
    #[diagnostic(code(pubtest::manifest))]
    Manifest { path: PathBuf, message: String },

    #[error("failed to {action} {}", path.display())]
    #[diagnostic(code(pubtest::filesystem))]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid search pattern `{pattern}`: {message}")]
    #[diagnostic(code(pubtest::pattern))]
    Pattern { pattern: String, message: String },

    #[error("flags {} mean different things to `dart test` and `flutter test`", flags.join(", "))]
    #[diagnostic(
        code(pubtest::conflicting_args),
        help("pass --dart-only or --flutter-only to choose which toolchain receives them")
    )]
    ConflictingArgs { flags: Vec<String> },

    #[error("I/O error: {0}")]
    #[diagnostic(code(pubtest::io))]
    Io(#[from] io::Error),
}

impl TestError {
    pub(crate) fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        TestError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type TestResult<T> = Result<T, TestError>;
