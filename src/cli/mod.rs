//! CLI module for pubtest
//!
//! ## Commands
//!
//! - `test [path]` - Discover, optimize, and run Dart/Flutter tests
//! - `clean [path]` - Remove optimizer files left behind by an interrupted run
//!
//! ## Modules
//!
//! - `test_runner` - The discovery → optimize → build → execute → cleanup pipeline
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use pubtest_core::ToolchainFilter;

use crate::errors::TestError;
use crate::version::PUBTEST_VERSION;

pub use pubtest_core::exit::ExitCode;

// ============================================================================
// CLI Error handling
// ============================================================================

/// A failed `pubtest` invocation, ready to print.
///
/// Test commands that fail are not `CliError`s; they only set the exit status. This type covers runs
/// that stopped before or around execution: nothing to test, a bad manifest, conflicting flags, or a
/// filesystem problem.
#[derive(Debug)]
pub struct CliError {
    /// Text printed to stderr by [`run`]
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Exit with status 1.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// `NoTestsFound` prints its one-line message ("No dart tests found"); every other error is
/// rendered through miette with its code, cause chain and help text.
impl From<TestError> for CliError {
    fn from(err: TestError) -> Self {
        match err {
            TestError::NoTestsFound { .. } => CliError::failure(err.to_string()),
            other => CliError::failure(format!("{:?}", miette::Report::new(other))),
        }
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Test orchestration for multi-package Dart and Flutter trees
#[derive(Parser, Debug)]
#[command(name = "pubtest")]
#[command(version = PUBTEST_VERSION)]
#[command(about = "Run Dart and Flutter tests across every package in a tree", long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tests
    Test(TestCommand),

    /// Remove optimizer files left behind by an interrupted run
    Clean {
        /// Package or workspace directory
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
        /// Include every package below PATH
        #[arg(short, long)]
        recursive: bool,
    },
}

#[derive(Args, Debug)]
pub struct TestCommand {
    /// Package or workspace directory
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
    /// Include every package below PATH
    #[arg(short, long)]
    pub recursive: bool,
    /// Run all test commands at the same time
    #[arg(short, long)]
    pub concurrent: bool,
    /// Stop after the first failing command
    #[arg(short, long)]
    pub bail: bool,
    /// Only run packages tested with `dart test`
    #[arg(long)]
    pub dart_only: bool,
    /// Only run packages tested with `flutter test`
    #[arg(long)]
    pub flutter_only: bool,
    /// Run each test directory as-is instead of generating optimizer files
    #[arg(long)]
    pub no_optimize: bool,
    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,
    /// Arguments forwarded to `dart test` / `flutter test`
    #[arg(last = true, value_name = "TEST_ARGS")]
    pub test_args: Vec<String>,
}

impl TestCommand {
    pub fn filter(&self) -> ToolchainFilter {
        ToolchainFilter::from_flags(self.dart_only, self.flutter_only)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Parse arguments, run the subcommand, and exit with its status.
///
/// The only caller of `process::exit`; subcommands return `CliResult`.
pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(exit_code) => {
            if !exit_code.is_success() {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Initialize structured logging; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pubtest=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

/// Dispatch to the subcommand.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Test(command) => test_runner::run_tests(&command, cli.verbose),
        Command::Clean { path, recursive } => test_runner::clean(&path, recursive, cli.verbose),
    }
}

// ============================================================================
// Tests
// ============================================================================
