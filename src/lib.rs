#![forbid(unsafe_code)]
//! pubtest: test orchestration for multi-package Dart and Flutter trees
//!
//! Finds every package under a directory, decides whether it is tested with `dart test` or
//! `flutter test`, folds each package's test files into a few generated entry points, and runs the
//! resulting commands sequentially or concurrently.
//!
//! ## Pipeline
//!
//! 1. [`project`] - locate `pubspec.yaml` files and resolve their `test/` directories
//! 2. [`optimize`] - write optimizer files grouping test files by toolchain sub-type
//! 3. [`runner`] - build commands, execute them, report, and clean up
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a logic error, use `.expect("INVARIANT: reason")` with a
//!   clear explanation.

pub mod cli;
pub mod config;
pub mod errors;
pub mod optimize;
pub mod project;
pub mod runner;
pub mod version;

pub use config::TestArgs;
pub use errors::{TestError, TestResult};
pub use optimize::{BindingClassifier, ContentClassifier, TestFileAggregator};
pub use project::{PubspecClassifier, PubspecLocator, TestDirectoryResolver, TestTargets};
pub use pubtest_core::{ToolchainFilter, ToolchainKind};
pub use runner::{CommandBuilder, CommandDescriptor, ExecutionEngine, RunOptions};
