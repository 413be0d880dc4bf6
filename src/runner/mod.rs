//! Command construction and execution
//!
//! ## Modules
//!
//! - `command` - Builds shell commands from test targets
//! - `process` - The process-spawning capability ([`CommandRunner`])
//! - `executor` - Sequential and concurrent batch execution
//! - `report` - Console reporting ([`Reporter`])
//! - `cleanup` - Removal of generated optimizer files
//!
//! ## I/O Boundaries
//!
//! Spawning processes and printing are behind traits so the engine can be driven by scripted
//! runners in tests and by alternative frontends.

pub mod cleanup;
pub mod command;
pub mod executor;
pub mod process;
pub mod report;

use std::path::PathBuf;
use std::time::Duration;

use pubtest_core::exit::ExitCode;

pub use cleanup::{CleanupGuard, CleanupSummary};
pub use command::{CommandBuilder, ToolchainArgs};
pub use executor::{BatchOutcome, ExecutionEngine, RunOptions};
pub use process::{CommandOutput, CommandRunner, OutputMode, ShellRunner};
pub use report::{ConsoleReporter, Reporter};

/// A shell command scheduled for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Full command line, run through the platform shell
    pub command: String,
    /// Directory the command runs in
    pub workdir: PathBuf,
    /// Optional grouping keys shown next to the label in reports
    pub keys: Option<Vec<String>>,
    /// Human-readable description printed before the command starts
    pub label: String,
}

/// How a scheduled command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The process ran and exited
    Exited(ExitCode),
    /// The process could not be started
    SpawnFailed(String),
    /// Never launched because an earlier command failed with bail enabled
    Skipped,
}

impl Outcome {
    /// Exit code this outcome contributes to the run; `None` for skipped commands.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            Outcome::Exited(code) => Some(*code),
            Outcome::SpawnFailed(_) => Some(ExitCode::FAILURE),
            Outcome::Skipped => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.exit_code().is_some_and(|code| !code.is_success())
    }
}

/// Result of one scheduled command.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub descriptor: CommandDescriptor,
    pub outcome: Outcome,
    /// Output captured in concurrent mode; empty when output went straight to the terminal
    pub output: String,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn skipped(descriptor: CommandDescriptor) -> Self {
        Self {
            descriptor,
            outcome: Outcome::Skipped,
            output: String::new(),
            duration: Duration::ZERO,
        }
    }
}
