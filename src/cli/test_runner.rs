//! Test runner pipeline
//!
//! `pubtest test` runs five stages in order:
//!
//! 1. Resolve test directories ([`TestDirectoryResolver`])
//! 2. Generate optimizer files ([`TestFileAggregator`]), unless disabled
//! 3. Split pass-through arguments per toolchain ([`TestArgs`])
//! 4. Build commands ([`CommandBuilder`])
//! 5. Execute them ([`ExecutionEngine`]) and remove the generated files
//!
//! ## I/O Boundaries
//!
//! Manifest discovery, classification and process spawning are injected through [`Collaborators`],
//! so the whole pipeline can run against a scripted [`CommandRunner`] in tests.

use std::fs;
use std::path::{Path, PathBuf};

use pubtest_core::ToolchainFilter;

use super::{CliResult, ExitCode, TestCommand};
use crate::config::TestArgs;
use crate::errors::{TestError, TestResult};
use crate::optimize::{BindingClassifier, ContentClassifier, TestFileAggregator, list_optimizer_files};
use crate::project::resolve::test_dir_of;
use crate::project::{
    ProjectClassifier, ProjectLocator, PubspecClassifier, PubspecLocator, TestDirectoryResolver,
    collect_manifests,
};
use crate::runner::cleanup::remove_optimizer_files;
use crate::runner::{
    BatchOutcome, CleanupGuard, CommandBuilder, CommandRunner, ConsoleReporter, ExecutionEngine, Reporter, RunOptions,
    ShellRunner,
};

/// Everything one `pubtest test` invocation asked for.
#[derive(Debug, Clone)]
pub struct TestPlan {
    /// Canonical directory the run starts from
    pub root: PathBuf,
    pub recursive: bool,
    pub filter: ToolchainFilter,
    pub optimize: bool,
    pub run: RunOptions,
    pub test_args: Vec<String>,
}

impl TestPlan {
    pub fn from_command(command: &TestCommand) -> TestResult<Self> {
        Ok(Self {
            root: canonical_root(&command.path)?,
            recursive: command.recursive,
            filter: command.filter(),
            optimize: !command.no_optimize,
            run: RunOptions {
                concurrent: command.concurrent,
                bail: command.bail,
                dry_run: command.dry_run,
            },
            test_args: command.test_args.clone(),
        })
    }
}

/// The capabilities the pipeline needs from the outside world.
pub struct Collaborators<'a, R> {
    pub locator: &'a dyn ProjectLocator,
    pub classifier: &'a dyn ProjectClassifier,
    pub content: &'a dyn ContentClassifier,
    pub engine: ExecutionEngine<R>,
}

impl Collaborators<'static, ShellRunner> {
    /// Disk-backed discovery and real processes.
    pub fn system() -> Self {
        Self {
            locator: &PubspecLocator,
            classifier: &PubspecClassifier,
            content: &BindingClassifier,
            engine: ExecutionEngine::new(ShellRunner),
        }
    }
}

/// Run the full pipeline for `plan`.
///
/// Generated optimizer files are removed before this returns, whether the run passed, failed, or
/// stopped with an error.
pub async fn run_plan<R: CommandRunner>(
    plan: &TestPlan,
    collaborators: &Collaborators<'_, R>,
    reporter: &mut dyn Reporter,
) -> TestResult<BatchOutcome> {
    let resolver = TestDirectoryResolver::new(collaborators.locator, collaborators.classifier);
    let dirs = resolver.resolve_from(&plan.root, plan.recursive, plan.filter)?;
    reporter.detail(&format!("Found {} test director{}", dirs.len(), if dirs.len() == 1 { "y" } else { "ies" }));

    let mut cleanup = CleanupGuard::new();
    let targets = if plan.optimize {
        let optimized = TestFileAggregator::new(collaborators.content).optimize(&dirs, &mut cleanup)?;
        if optimized.is_empty() {
            return Err(TestError::NoTestsFound { filter: plan.filter });
        }
        optimized
    } else {
        dirs
    };

    let args = TestArgs::partition(&plan.test_args).resolve(targets.values().copied())?;
    let commands = CommandBuilder::detecting(&plan.root).build(&targets, &args);

    let outcome = collaborators.engine.execute(commands, plan.run, reporter).await;

    let summary = cleanup.finish();
    if !summary.removed.is_empty() {
        reporter.detail(&format!("Removed {} optimizer file(s)", summary.removed.len()));
    }
    for path in &summary.refused {
        reporter.warn(&format!("Left {} in place: not a generated file", path.display()));
    }
    Ok(outcome)
}

/// Entry point for `pubtest test`.
pub fn run_tests(command: &TestCommand, verbose: bool) -> CliResult<ExitCode> {
    let plan = TestPlan::from_command(command)?;
    tracing::debug!(root = %plan.root.display(), filter = ?plan.filter, "starting test run");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(TestError::from)?;

    let collaborators = Collaborators::system();
    let mut reporter = ConsoleReporter::new(verbose);
    let outcome = runtime.block_on(run_plan(&plan, &collaborators, &mut reporter))?;
    Ok(outcome.status)
}

/// Find optimizer files left in the test directories covered by `root`.
pub fn stale_optimizer_files(locator: &dyn ProjectLocator, root: &Path, recursive: bool) -> TestResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for manifest in collect_manifests(locator, root, recursive)? {
        if let Some(dir) = test_dir_of(&manifest) {
            files.extend(list_optimizer_files(&dir)?);
        }
    }
    Ok(files)
}

/// Entry point for `pubtest clean`.
pub fn clean(path: &Path, recursive: bool, verbose: bool) -> CliResult<ExitCode> {
    let root = canonical_root(path)?;
    let files = stale_optimizer_files(&PubspecLocator, &root, recursive)?;

    let mut reporter = ConsoleReporter::new(verbose);
    let summary = remove_optimizer_files(files.iter().map(PathBuf::as_path));
    for removed in &summary.removed {
        reporter.detail(&format!("removed {}", removed.display()));
    }
    reporter.info(&format!("Removed {} optimizer file(s)", summary.removed.len()));
    Ok(ExitCode::SUCCESS)
}

fn canonical_root(path: &Path) -> TestResult<PathBuf> {
    fs::canonicalize(path).map_err(|e| TestError::filesystem("resolve", path, e))
}
