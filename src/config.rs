//! Pass-through arguments for `dart test` and `flutter test`
//!
//! Arguments given after `--` are routed to the toolchain(s) that understand them, using a
//! declarative table of known flags. Unknown arguments are passed to both toolchains.

use pubtest_core::ToolchainKind;

use crate::errors::{TestError, TestResult};
use crate::runner::ToolchainArgs;

/// Which toolchain(s) accept a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgScope {
    Dart,
    Flutter,
    Both,
    /// Accepted by both, with different meanings; only valid when one toolchain is in play
    Conflicting,
}

/// A known test flag.
#[derive(Debug, Clone, Copy)]
pub struct ArgDef {
    pub long: &'static str,
    pub short: Option<&'static str>,
    pub takes_value: bool,
    pub scope: ArgScope,
}

const fn def(long: &'static str, short: Option<&'static str>, takes_value: bool, scope: ArgScope) -> ArgDef {
    ArgDef {
        long,
        short,
        takes_value,
        scope,
    }
}

/// Known `test` flags of both toolchains.
pub const TEST_ARG_DEFS: &[ArgDef] = &[
    // Shared selection and reporting
    def("--name", Some("-n"), true, ArgScope::Both),
    def("--plain-name", Some("-N"), true, ArgScope::Both),
    def("--tags", Some("-t"), true, ArgScope::Both),
    def("--exclude-tags", Some("-x"), true, ArgScope::Both),
    def("--reporter", Some("-r"), true, ArgScope::Both),
    def("--file-reporter", None, true, ArgScope::Both),
    def("--timeout", None, true, ArgScope::Both),
    def("--concurrency", Some("-j"), true, ArgScope::Both),
    def("--total-shards", None, true, ArgScope::Both),
    def("--shard-index", None, true, ArgScope::Both),
    def("--test-randomize-ordering-seed", None, true, ArgScope::Both),
    def("--run-skipped", None, false, ArgScope::Both),
    def("--fail-fast", None, false, ArgScope::Both),
    // dart test
    def("--preset", Some("-P"), true, ArgScope::Dart),
    def("--compiler", Some("-c"), true, ArgScope::Dart),
    def("--chain-stack-traces", None, false, ArgScope::Dart),
    def("--no-chain-stack-traces", None, false, ArgScope::Dart),
    def("--pause-after-load", None, false, ArgScope::Dart),
    def("--debug", None, false, ArgScope::Dart),
    def("--use-data-isolate-strategy", None, false, ArgScope::Dart),
    // flutter test
    def("--update-goldens", None, false, ArgScope::Flutter),
    def("--pub", None, false, ArgScope::Flutter),
    def("--no-pub", None, false, ArgScope::Flutter),
    def("--flavor", None, true, ArgScope::Flutter),
    def("--dart-define", None, true, ArgScope::Flutter),
    def("--dart-define-from-file", None, true, ArgScope::Flutter),
    def("--device-id", Some("-d"), true, ArgScope::Flutter),
    def("--coverage-path", None, true, ArgScope::Flutter),
    def("--merge-coverage", None, false, ArgScope::Flutter),
    def("--branch-coverage", None, false, ArgScope::Flutter),
    def("--start-paused", None, false, ArgScope::Flutter),
    def("--test-assets", None, false, ArgScope::Flutter),
    def("--no-test-assets", None, false, ArgScope::Flutter),
    def("--enable-impeller", None, false, ArgScope::Flutter),
    // `dart test --coverage=<dir>` vs `flutter test --coverage`; platforms differ entirely
    def("--coverage", None, false, ArgScope::Conflicting),
    def("--platform", Some("-p"), true, ArgScope::Conflicting),
];

fn lookup(flag: &str) -> Option<&'static ArgDef> {
    TEST_ARG_DEFS
        .iter()
        .find(|d| d.long == flag || d.short == Some(flag))
}

/// Pass-through arguments split by the toolchain(s) that accept them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestArgs {
    pub dart: Vec<String>,
    pub flutter: Vec<String>,
    pub both: Vec<String>,
    pub conflicting: Vec<String>,
    /// Flag names found in `conflicting`, for error messages
    pub conflicting_flags: Vec<String>,
}

impl TestArgs {
    /// Split raw arguments into groups.
    ///
    /// Both `--flag=value` and `--flag value` forms are recognised; a value always travels with its
    /// flag. Anything not in [`TEST_ARG_DEFS`] goes to both toolchains.
    pub fn partition(args: &[String]) -> Self {
        let mut out = TestArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let (flag, inline_value) = match arg.split_once('=') {
                Some((flag, _)) if arg.starts_with("--") => (flag, true),
                _ => (arg.as_str(), false),
            };

            let Some(def) = lookup(flag) else {
                out.both.push(arg.clone());
                continue;
            };

            let mut tokens = vec![arg.clone()];
            if def.takes_value && !inline_value {
                tokens.extend(iter.next().cloned());
            }

            let group = match def.scope {
                ArgScope::Dart => &mut out.dart,
                ArgScope::Flutter => &mut out.flutter,
                ArgScope::Both => &mut out.both,
                ArgScope::Conflicting => {
                    if !out.conflicting_flags.iter().any(|f| f == def.long) {
                        out.conflicting_flags.push(def.long.to_string());
                    }
                    &mut out.conflicting
                }
            };
            group.extend(tokens);
        }

        out
    }

    /// Produce the per-toolchain argument lists for a run covering the `present` toolchains.
    ///
    /// Conflicting flags go to the single toolchain in play; with both present they are an error.
    pub fn resolve<I>(&self, present: I) -> TestResult<ToolchainArgs>
    where
        I: IntoIterator<Item = ToolchainKind>,
    {
        let mut present: Vec<ToolchainKind> = present.into_iter().collect();
        present.sort();
        present.dedup();

        let target = match present.as_slice() {
            _ if self.conflicting.is_empty() => None,
            [only] => Some(*only),
            _ => {
                return Err(TestError::ConflictingArgs {
                    flags: self.conflicting_flags.clone(),
                });
            }
        };

        let assemble = |kind: ToolchainKind, specific: &[String]| {
            let mut args = self.both.clone();
            args.extend_from_slice(specific);
            if target == Some(kind) {
                args.extend_from_slice(&self.conflicting);
            }
            args
        };

        Ok(ToolchainArgs {
            dart: assemble(ToolchainKind::Dart, self.dart.as_slice()),
            flutter: assemble(ToolchainKind::Flutter, self.flutter.as_slice()),
        })
    }
}
