//! Shared naming conventions (well-known file and directory names).

use crate::ToolchainKind;

/// Package manifest file name.
pub const MANIFEST_FILE: &str = "pubspec.yaml";

/// Lockfile written next to the manifest by `pub get`.
pub const LOCKFILE_FILE: &str = "pubspec.lock";

/// Conventional test directory, a sibling of the manifest.
pub const TEST_DIR: &str = "test";

/// Conventional library directory; used as a fallback anchor when deriving a project root.
pub const LIB_DIR: &str = "lib";

/// Suffix every test file name ends with.
pub const TEST_FILE_SUFFIX: &str = "_test.dart";

/// Extension of generated optimizer files.
pub const DART_EXTENSION: &str = "dart";

/// Reserved basename of generated optimizer files.
///
/// Any file whose name contains this token is treated as generated output: it is never collected
/// as a test file and it is the only kind of file cleanup will delete.
pub const OPTIMIZER_BASENAME: &str = ".test_optimizer";

/// Suffix of the Flutter test binding class names sniffed from test sources.
pub const BINDING_SUFFIX: &str = "TestWidgetsFlutterBinding";

/// Label for every test file in a Dart package.
pub const DART_LABEL: &str = "dart";

/// Label for Flutter test files that declare no binding.
pub const FLUTTER_LABEL: &str = "flutter";

/// Label for Flutter test files using the bare `TestWidgetsFlutterBinding`.
pub const WIDGETS_LABEL: &str = "widgets";

/// FVM pin files; their presence routes toolchain calls through `fvm`.
pub const FVM_MARKERS: [&str; 2] = [".fvmrc", ".fvm"];

/// Check whether a file name belongs to a generated optimizer file.
pub fn is_optimizer_file(file_name: &str) -> bool {
    file_name.contains(OPTIMIZER_BASENAME)
}

/// Check whether a file name follows the `*_test.dart` convention.
pub fn is_test_file(file_name: &str) -> bool {
    file_name.len() > TEST_FILE_SUFFIX.len() && file_name.ends_with(TEST_FILE_SUFFIX)
}

/// Compute the optimizer file name for a sub-type label.
///
/// ## Returns
/// - `.test_optimizer.dart` when `label` is the toolchain's default label.
/// - `.test_optimizer.<label>.dart` otherwise.
///
/// ## Examples
/// ```rust
/// use pubtest_core::ToolchainKind;
/// use pubtest_core::conventions::optimizer_file_name;
///
/// assert_eq!(optimizer_file_name(ToolchainKind::Flutter, "flutter"), ".test_optimizer.dart");
/// assert_eq!(optimizer_file_name(ToolchainKind::Flutter, "live"), ".test_optimizer.live.dart");
/// ```
pub fn optimizer_file_name(kind: ToolchainKind, label: &str) -> String {
    if label == kind.default_label() {
        format!("{OPTIMIZER_BASENAME}.{DART_EXTENSION}")
    } else {
        format!("{OPTIMIZER_BASENAME}.{label}.{DART_EXTENSION}")
    }
}

/// Turn the prefix of a matched binding class name into a sub-type label.
///
/// ## Parameters
/// - `prefix`: the class name with [`BINDING_SUFFIX`] stripped (e.g. `Automated`).
///
/// ## Returns
/// - The lower-cased prefix, or [`WIDGETS_LABEL`] when the prefix is empty.
pub fn binding_label(prefix: &str) -> String {
    if prefix.is_empty() {
        WIDGETS_LABEL.to_string()
    } else {
        prefix.to_lowercase()
    }
}
