//! Process spawning.

use std::future::Future;
use std::io;
use std::process::Stdio;

use pubtest_core::exit::ExitCode;
use tokio::process::Command;

use super::CommandDescriptor;

/// Where a command's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream straight to the terminal (sequential runs)
    Inherit,
    /// Collect stdout and stderr for printing once the command finishes (concurrent runs)
    Capture,
}

/// Exit code plus whatever output was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: ExitCode,
    pub output: String,
}

/// Run one command to completion.
///
/// An `Err` means the process could not be started; the engine records it as a failed command.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(&self, command: &CommandDescriptor, mode: OutputMode) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}

/// Runs commands through the platform shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, command: &CommandDescriptor, mode: OutputMode) -> io::Result<CommandOutput> {
        let mut cmd = Self::shell(&command.command);
        cmd.current_dir(&command.workdir).stdin(Stdio::null());

        match mode {
            OutputMode::Inherit => {
                let status = cmd.status().await?;
                Ok(CommandOutput {
                    exit_code: ExitCode::from_status_code(status.code()),
                    output: String::new(),
                })
            }
            OutputMode::Capture => {
                let output = cmd.output().await?;
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                Ok(CommandOutput {
                    exit_code: ExitCode::from_status_code(output.status.code()),
                    output: text,
                })
            }
        }
    }
}
