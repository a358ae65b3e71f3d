//! Remold Test Harness
//!
//! Shared helpers for refactoring tests:
//! - [`trim_indent`] to write expected sources as indented raw strings
//! - [`assert_refactored`] / [`assert_unchanged`] to run a [`Refactor`] and
//!   compare the printed result, failing with a line diff
//! - [`assert_round_trip`] for parser fidelity
//! - [`TempProject`] for on-disk fixtures

pub mod fixtures;

pub use fixtures::TempProject;

use remold_core::{Language, Parser, Refactor, SourceFile, print, print_trimmed};
use similar::{ChangeTag, TextDiff};

/// Remove the first and last line when blank, then the common indentation
pub fn trim_indent(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line diff of two texts, `-` for expected and `+` for actual
pub fn diff(expected: &str, actual: &str) -> String {
    let mut out = String::new();
    for change in TextDiff::from_lines(expected, actual).iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        out.push(sign);
        out.push_str(change.as_str().unwrap_or_default().trim_end_matches('\n'));
        out.push('\n');
    }
    out
}

/// Assert two texts are equal, panicking with a diff otherwise
#[track_caller]
pub fn assert_same_text(actual: &str, expected: &str) {
    if actual != expected {
        panic!(
            "text differs (-expected +actual):\n{}",
            diff(expected, actual)
        );
    }
}

/// Parsing then printing reproduces the input
#[track_caller]
pub fn assert_round_trip<L: Language, P: Parser<L>>(parser: &P, text: &str) {
    let source = parser
        .parse_str(std::path::Path::new("round-trip"), text)
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
    assert_same_text(&print(&source.root), text);
}

/// Run `refactor` over `sources` and compare the change to `source` with `expected`
///
/// `expected` is passed through [`trim_indent`] and compared with the
/// trimmed print of the fixed tree.
#[track_caller]
pub fn assert_refactored<L: Language>(
    refactor: &Refactor<L>,
    sources: &[SourceFile<L>],
    source: usize,
    expected: &str,
) {
    let outcome = refactor
        .fix(sources)
        .unwrap_or_else(|e| panic!("refactor failed: {e}"));
    if let Some(failure) = outcome.failures.first() {
        panic!(
            "{} failed on '{}': {}",
            failure.visitor,
            failure.path.display(),
            failure.error
        );
    }
    let path = &sources[source].path;
    let change = outcome
        .changes
        .iter()
        .find(|c| &c.path == path)
        .unwrap_or_else(|| panic!("'{}' was not changed", path.display()));
    assert_same_text(&print_trimmed(&change.fixed), &trim_indent(expected));
}

/// Run `refactor` and assert it changes nothing
#[track_caller]
pub fn assert_unchanged<L: Language>(refactor: &Refactor<L>, sources: &[SourceFile<L>]) {
    let outcome = refactor
        .fix(sources)
        .unwrap_or_else(|e| panic!("refactor failed: {e}"));
    if let Some(change) = outcome.changes.first() {
        panic!(
            "'{}' was changed:\n{}",
            change.path.display(),
            change.diff()
        );
    }
}

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_indent() {
        let text = "
            class A {
                int n;
            }
        ";
        assert_eq!(trim_indent(text), "class A {\n    int n;\n}");
        assert_eq!(trim_indent("a\n\n  b"), "a\n\n  b");
    }

    #[test]
    fn test_diff_marks_lines() {
        let d = diff("a\nb\n", "a\nc\n");
        assert!(d.contains("-b"));
        assert!(d.contains("+c"));
        assert!(d.contains(" a"));
    }

    #[test]
    #[should_panic(expected = "text differs")]
    fn test_assert_same_text_panics() {
        assert_same_text("a", "b");
    }
}
