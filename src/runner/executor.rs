//! Batch execution: sequential or concurrent, with optional bail.
//!
//! ## Bail policy
//!
//! - Sequential: exact. The first failing command ends the batch; later commands are reported as
//!   skipped and never launched.
//! - Concurrent: advisory. Every command becomes its own task, and a shared flag is checked right
//!   before a task launches its process. A task that sees the flag set never launches; processes
//!   already running are left to finish and their results are kept.
//!
//! A command that cannot be spawned counts as a failure exactly like a non-zero exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use pubtest_core::exit::{self, ExitCode};
use tokio::task::JoinSet;

use super::process::{CommandRunner, OutputMode};
use super::report::Reporter;
use super::{CommandDescriptor, ExecutionResult, Outcome};

/// Flags controlling how a batch runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub concurrent: bool,
    pub bail: bool,
    /// Report the commands without launching them
    pub dry_run: bool,
}

/// Every result of a batch (in submission order) and the status it reduces to.
#[derive(Debug)]
pub struct BatchOutcome {
    pub status: ExitCode,
    pub results: Vec<ExecutionResult>,
}

impl BatchOutcome {
    pub fn failures(&self) -> Vec<&ExecutionResult> {
        self.results.iter().filter(|r| r.outcome.is_failure()).collect()
    }
}

/// Runs batches of commands through an injected [`CommandRunner`].
pub struct ExecutionEngine<R> {
    runner: Arc<R>,
}

impl<R: CommandRunner> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    /// Execute `commands` and reduce their results to one exit status.
    #[tracing::instrument(skip_all, fields(commands = commands.len(), concurrent = options.concurrent, bail = options.bail))]
    pub async fn execute(
        &self,
        commands: Vec<CommandDescriptor>,
        options: RunOptions,
        reporter: &mut dyn Reporter,
    ) -> BatchOutcome {
        let outcome = if options.dry_run {
            dry_run(commands, reporter)
        } else if options.concurrent {
            self.run_concurrent(commands, options.bail, reporter).await
        } else {
            self.run_sequential(commands, options.bail, reporter).await
        };

        reporter.failures(&outcome.failures());
        tracing::info!(status = outcome.status.0, "batch finished");
        outcome
    }

    async fn run_sequential(
        &self,
        commands: Vec<CommandDescriptor>,
        bail: bool,
        reporter: &mut dyn Reporter,
    ) -> BatchOutcome {
        let mut status = ExitCode::SUCCESS;
        let mut results = Vec::with_capacity(commands.len());
        let mut pending = commands.into_iter();

        while let Some(descriptor) = pending.next() {
            reporter.command_started(&descriptor);
            let result = run_one(self.runner.as_ref(), descriptor, OutputMode::Inherit).await;
            reporter.command_finished(&result);

            let failed = result.outcome.is_failure();
            if failed {
                status = result.outcome.exit_code().unwrap_or(ExitCode::FAILURE);
            }
            results.push(result);

            if failed && bail {
                tracing::debug!("bailing after first failure");
                results.extend(pending.by_ref().map(ExecutionResult::skipped));
                break;
            }
        }

        BatchOutcome { status, results }
    }

    async fn run_concurrent(
        &self,
        commands: Vec<CommandDescriptor>,
        bail: bool,
        reporter: &mut dyn Reporter,
    ) -> BatchOutcome {
        let bailed = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for (index, descriptor) in commands.iter().cloned().enumerate() {
            reporter.detail(&format!("queued: {}", descriptor.label));
            let runner = Arc::clone(&self.runner);
            let bailed = Arc::clone(&bailed);
            tasks.spawn(async move {
                if bail && bailed.load(Ordering::SeqCst) {
                    return (index, ExecutionResult::skipped(descriptor));
                }
                let result = run_one(runner.as_ref(), descriptor, OutputMode::Capture).await;
                if bail && result.outcome.is_failure() {
                    bailed.store(true, Ordering::SeqCst);
                }
                (index, result)
            });
        }

        let mut slots: Vec<Option<ExecutionResult>> = (0..commands.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    reporter.command_finished(&result);
                    slots[index] = Some(result);
                }
                Err(e) => {
                    tracing::error!(error = %e, "command task did not complete");
                    reporter.error(&format!("A test command did not complete: {e}"));
                }
            }
        }

        // A task that panicked left its slot empty; it still counts as a failed command.
        let results: Vec<ExecutionResult> = slots
            .into_iter()
            .zip(commands)
            .map(|(slot, descriptor)| {
                slot.unwrap_or_else(|| ExecutionResult {
                    descriptor,
                    outcome: Outcome::SpawnFailed("command task did not complete".to_string()),
                    output: String::new(),
                    duration: Default::default(),
                })
            })
            .collect();

        let status = exit::reduce(results.iter().filter_map(|r| r.outcome.exit_code()));
        BatchOutcome { status, results }
    }
}

fn dry_run(commands: Vec<CommandDescriptor>, reporter: &mut dyn Reporter) -> BatchOutcome {
    let results = commands
        .into_iter()
        .map(|descriptor| {
            reporter.info(&format!("{}\n  $ {}  (in {})", descriptor.label, descriptor.command, descriptor.workdir.display()));
            ExecutionResult::skipped(descriptor)
        })
        .collect();
    BatchOutcome {
        status: ExitCode::SUCCESS,
        results,
    }
}

async fn run_one<R: CommandRunner>(runner: &R, descriptor: CommandDescriptor, mode: OutputMode) -> ExecutionResult {
    let start = Instant::now();
    let (outcome, output) = match runner.run(&descriptor, mode).await {
        Ok(out) => (Outcome::Exited(out.exit_code), out.output),
        Err(e) => {
            tracing::warn!(command = %descriptor.command, error = %e, "failed to start command");
            (Outcome::SpawnFailed(e.to_string()), String::new())
        }
    };
    ExecutionResult {
        descriptor,
        outcome,
        output,
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::process::CommandOutput;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Answers by command text: `ok`, `fail:<code>`, or `spawn-error`.
    #[derive(Default)]
    struct ScriptedRunner {
        calls: Mutex<Vec<String>>,
    }

    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &CommandDescriptor, _mode: OutputMode) -> io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(command.command.clone());
            let exit_code = match command.command.as_str() {
                "ok" => ExitCode::SUCCESS,
                "spawn-error" => return Err(io::Error::new(io::ErrorKind::NotFound, "sh: not found")),
                other => ExitCode(other.trim_start_matches("fail:").parse().unwrap()),
            };
            Ok(CommandOutput {
                exit_code,
                output: String::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        started: Vec<String>,
        failed: Vec<String>,
    }

    impl Reporter for RecordingReporter {
        fn info(&mut self, _message: &str) {}
        fn warn(&mut self, _message: &str) {}
        fn error(&mut self, _message: &str) {}

        fn command_started(&mut self, command: &CommandDescriptor) {
            self.started.push(command.label.clone());
        }

        fn command_finished(&mut self, _result: &ExecutionResult) {}

        fn failures(&mut self, failed: &[&ExecutionResult]) {
            self.failed = failed.iter().map(|r| r.descriptor.label.clone()).collect();
        }
    }

    fn commands(texts: &[&str]) -> Vec<CommandDescriptor> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| CommandDescriptor {
                command: text.to_string(),
                workdir: PathBuf::from("."),
                keys: None,
                label: format!("#{i} {text}"),
            })
            .collect()
    }

    async fn execute(texts: &[&str], options: RunOptions) -> (BatchOutcome, Vec<String>, RecordingReporter) {
        let engine = ExecutionEngine::new(ScriptedRunner::default());
        let mut reporter = RecordingReporter::default();
        let outcome = engine.execute(commands(texts), options, &mut reporter).await;
        let calls = engine.runner.calls.lock().unwrap().clone();
        (outcome, calls, reporter)
    }

    #[tokio::test]
    async fn sequential_bail_stops_at_first_failure() {
        let options = RunOptions {
            bail: true,
            ..Default::default()
        };
        let (outcome, calls, reporter) = execute(&["ok", "fail:2", "ok"], options).await;

        assert_eq!(calls, vec!["ok", "fail:2"]);
        assert_eq!(outcome.status, ExitCode(2));
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results[2].outcome, Outcome::Skipped);
        assert_eq!(reporter.started, vec!["#0 ok", "#1 fail:2"]);
        assert_eq!(reporter.failed, vec!["#1 fail:2"]);
    }

    #[tokio::test]
    async fn sequential_without_bail_runs_everything() {
        let (outcome, calls, _) = execute(&["ok", "fail:2", "ok"], RunOptions::default()).await;
        assert_eq!(calls.len(), 3);
        assert_eq!(outcome.status, ExitCode(2));
    }

    #[tokio::test]
    async fn sequential_keeps_last_failure() {
        let (outcome, _, reporter) = execute(&["fail:2", "ok", "fail:5"], RunOptions::default()).await;
        assert_eq!(outcome.status, ExitCode(5));
        assert_eq!(reporter.failed, vec!["#0 fail:2", "#2 fail:5"]);
    }

    #[tokio::test]
    async fn concurrent_reports_every_failure_in_order() {
        let options = RunOptions {
            concurrent: true,
            ..Default::default()
        };
        let (outcome, calls, reporter) = execute(&["fail:3", "ok", "fail:4"], options).await;

        assert_eq!(calls.len(), 3);
        assert_eq!(reporter.failed, vec!["#0 fail:3", "#2 fail:4"]);
        assert_eq!(outcome.status, ExitCode(3));
        let labels: Vec<_> = outcome.results.iter().map(|r| r.descriptor.label.as_str()).collect();
        assert_eq!(labels, vec!["#0 fail:3", "#1 ok", "#2 fail:4"]);
    }

    #[tokio::test]
    async fn concurrent_bail_stops_later_launches() {
        let options = RunOptions {
            concurrent: true,
            bail: true,
            ..Default::default()
        };
        // The current-thread test runtime polls tasks in spawn order, so the failure is observed
        // before the later tasks reach their launch check.
        let (outcome, calls, reporter) = execute(&["fail:1", "ok", "ok"], options).await;

        assert_eq!(calls, vec!["fail:1"]);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results[0].outcome, Outcome::Exited(ExitCode(1)));
        assert!(outcome.results[1..].iter().all(|r| r.outcome == Outcome::Skipped));
        assert_eq!(outcome.status, ExitCode(1));
        assert_eq!(reporter.failed, vec!["#0 fail:1"]);
    }

    #[tokio::test]
    async fn concurrent_all_passing_is_success() {
        let options = RunOptions {
            concurrent: true,
            ..Default::default()
        };
        let (outcome, _, reporter) = execute(&["ok", "ok"], options).await;
        assert_eq!(outcome.status, ExitCode::SUCCESS);
        assert!(reporter.failed.is_empty());
    }

    #[tokio::test]
    async fn spawn_failure_counts_as_failure() {
        let (outcome, calls, reporter) = execute(&["spawn-error", "ok"], RunOptions::default()).await;
        assert_eq!(calls.len(), 2);
        assert_eq!(outcome.status, ExitCode::FAILURE);
        assert!(matches!(outcome.results[0].outcome, Outcome::SpawnFailed(_)));
        assert_eq!(reporter.failed, vec!["#0 spawn-error"]);
    }

    #[tokio::test]
    async fn dry_run_launches_nothing() {
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let (outcome, calls, _) = execute(&["fail:1"], options).await;
        assert!(calls.is_empty());
        assert_eq!(outcome.status, ExitCode::SUCCESS);
    }
}
