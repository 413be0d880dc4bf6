//! Console reporting.
//!
//! ## Reporter Trait
//!
//! The engine reports through the [`Reporter`] trait so output formats can change without touching
//! execution. Reporting never influences control flow.

use super::{CommandDescriptor, ExecutionResult, Outcome};

/// Receives progress and results from a run.
pub trait Reporter {
    /// Extra detail, only interesting with `--verbose`
    fn detail(&mut self, _message: &str) {}

    fn info(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    fn error(&mut self, message: &str);

    /// Called right before a command is launched
    fn command_started(&mut self, command: &CommandDescriptor);

    /// Called when a command finishes (or is skipped)
    fn command_finished(&mut self, result: &ExecutionResult);

    /// Called once per batch with every failing command, in submission order
    fn failures(&mut self, failed: &[&ExecutionResult]);
}

/// Default reporter writing to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Exited(code) if code.is_success() => "\x1b[32mpassed\x1b[0m".to_string(),
        Outcome::Exited(code) => format!("\x1b[31mfailed\x1b[0m (exit code {code})"),
        Outcome::SpawnFailed(reason) => format!("\x1b[31mcould not start\x1b[0m ({reason})"),
        Outcome::Skipped => "\x1b[33mskipped\x1b[0m".to_string(),
    }
}

fn with_keys(command: &CommandDescriptor) -> String {
    match &command.keys {
        Some(keys) if !keys.is_empty() => format!("{} [{}]", command.label, keys.join(", ")),
        _ => command.label.clone(),
    }
}

impl Reporter for ConsoleReporter {
    fn detail(&mut self, message: &str) {
        if self.verbose {
            eprintln!("\x1b[2m{}\x1b[0m", message);
        }
    }

    fn info(&mut self, message: &str) {
        eprintln!("{}", message);
    }

    fn warn(&mut self, message: &str) {
        eprintln!("\x1b[33m{}\x1b[0m", message);
    }

    fn error(&mut self, message: &str) {
        eprintln!("\x1b[31m{}\x1b[0m", message);
    }

    fn command_started(&mut self, command: &CommandDescriptor) {
        eprintln!("\x1b[1m{}\x1b[0m", with_keys(command));
        self.detail(&format!("$ {}  (in {})", command.command, command.workdir.display()));
    }

    fn command_finished(&mut self, result: &ExecutionResult) {
        if !result.output.is_empty() {
            eprintln!("\x1b[1m{}\x1b[0m", with_keys(&result.descriptor));
            eprint!("{}", result.output);
            if !result.output.ends_with('\n') {
                eprintln!();
            }
        }
        if result.outcome == Outcome::Skipped {
            self.detail(&format!("{}: {}", result.descriptor.label, describe(&result.outcome)));
            return;
        }
        eprintln!(
            "{}: {} in {:.2}s",
            result.descriptor.label,
            describe(&result.outcome),
            result.duration.as_secs_f64()
        );
    }

    fn failures(&mut self, failed: &[&ExecutionResult]) {
        if failed.is_empty() {
            return;
        }
        eprintln!();
        eprintln!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
        let width = failed.iter().map(|r| with_keys(&r.descriptor).len()).max().unwrap_or(0);
        for result in failed {
            eprintln!(
                "  {:<width$}  {}",
                with_keys(&result.descriptor),
                describe(&result.outcome),
                width = width
            );
            self.detail(&format!("    $ {}", result.descriptor.command));
        }
    }
}
