//! Optimizer file content.
//!
//! Each test file is imported under an alias and its `main` is invoked inside a `group` named after
//! the file, so test names in reports still show where a test came from.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use pubtest_core::ToolchainKind;

const HEADER: &str = "// GENERATED CODE - DO NOT MODIFY BY HAND\n\
// Created by pubtest for a single run and deleted afterwards.\n\
// ignore_for_file: directives_ordering, type=lint\n";

fn test_package_import(kind: ToolchainKind) -> &'static str {
    match kind {
        ToolchainKind::Dart => "package:test/test.dart",
        ToolchainKind::Flutter => "package:flutter_test/flutter_test.dart",
    }
}

/// Turn a file stem into a valid Dart identifier.
fn import_alias(stem: &str) -> String {
    let mut alias: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if alias.starts_with(|c: char| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    alias
}

/// Escape text for a single-quoted Dart string literal.
fn dart_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '\'' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One imported test file.
struct Entry {
    name: String,
    stem: String,
    alias: String,
}

/// Pair each file with an import prefix that no other file in the group uses.
fn entries(files: &[&Path]) -> Vec<Entry> {
    let mut taken = HashSet::new();
    files
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let stem = name.strip_suffix(".dart").unwrap_or(name);
            let base = import_alias(stem);
            let mut alias = base.clone();
            let mut n = 2;
            while !taken.insert(alias.clone()) {
                alias = format!("{base}_{n}");
                n += 1;
            }
            Some(Entry {
                name: name.to_string(),
                stem: stem.to_string(),
                alias,
            })
        })
        .collect()
}

/// Render the optimizer file for `files`, all living directly in the optimizer's directory.
pub fn render(kind: ToolchainKind, files: &[&Path]) -> String {
    let entries = entries(files);

    let mut out = String::from(HEADER);
    let _ = writeln!(out);
    let _ = writeln!(out, "import '{}';", test_package_import(kind));
    let _ = writeln!(out);
    for entry in &entries {
        let _ = writeln!(out, "import '{}' as {};", dart_string(&entry.name), entry.alias);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "void main() {{");
    for entry in &entries {
        let _ = writeln!(out, "  group('{}', () {{", dart_string(&entry.stem));
        let _ = writeln!(out, "    {}.main();", entry.alias);
        let _ = writeln!(out, "  }});");
    }
    let _ = writeln!(out, "}}");
    out
}
