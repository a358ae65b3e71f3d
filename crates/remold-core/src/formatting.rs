//! Formatting model
//!
//! Whitespace and comments between tokens are stored as data on the node that
//! follows them (the *prefix*), never recomputed from positions. A node may
//! also carry a *suffix*, used for trailing text that no later node owns (for
//! example whitespace at the end of a file).
//!
//! Nodes created by a visitor without known formatting use
//! [`Formatting::infer`]; the printer replaces those with a best-effort guess
//! from the surrounding nodes (see [`crate::printer`]).

use serde::{Deserialize, Serialize};

/// Prefix/suffix trivia of a single node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Formatting {
    prefix: String,
    suffix: String,
    inferred: bool,
}

impl Formatting {
    /// No whitespace before or after the node
    pub const EMPTY: Formatting = Formatting {
        prefix: String::new(),
        suffix: String::new(),
        inferred: false,
    };

    /// Formatting with the given prefix and no suffix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: String::new(),
            inferred: false,
        }
    }

    /// Formatting to be decided by the printer from the node's neighbours
    pub fn infer() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            inferred: true,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: self.suffix.clone(),
            inferred: false,
        }
    }

    pub fn with_suffix(&self, suffix: impl Into<String>) -> Self {
        Self {
            prefix: self.prefix.clone(),
            suffix: suffix.into(),
            inferred: self.inferred,
        }
    }

    /// Whether the prefix starts the node on a new line
    pub fn has_newline(&self) -> bool {
        self.prefix.contains('\n')
    }

    /// Indentation of the line the node starts on, if the prefix contains a line break
    pub fn indent(&self) -> Option<&str> {
        self.prefix.rfind('\n').map(|idx| &self.prefix[idx + 1..])
    }

    /// The prefix with its final indentation replaced
    ///
    /// Comments and blank lines before the last line break are kept.
    pub fn reindented(&self, indent: &str) -> Self {
        match self.prefix.rfind('\n') {
            Some(idx) => self.with_prefix(format!("{}{}", &self.prefix[..=idx], indent)),
            None => self.clone(),
        }
    }
}

/// Insert `indent` after every line break in `text`
pub fn shift_lines(text: &str, indent: &str) -> String {
    if indent.is_empty() || !text.contains('\n') {
        return text.to_string();
    }
    text.replace('\n', &format!("\n{indent}"))
}

/// Remove up to `width` columns of leading spaces after every line break in `text`
pub fn unshift_lines(text: &str, width: usize) -> String {
    if width == 0 || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        let strip = line
            .char_indices()
            .take_while(|(i, c)| *i < width && (*c == ' ' || *c == '\t'))
            .count();
        out.push_str(&line[strip..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_of_prefix() {
        assert_eq!(Formatting::new("\n    ").indent(), Some("    "));
        assert_eq!(Formatting::new("\n\n  // note\n\t").indent(), Some("\t"));
        assert_eq!(Formatting::new(" ").indent(), None);
        assert_eq!(Formatting::EMPTY.indent(), None);
    }

    #[test]
    fn test_reindented_keeps_comments() {
        let f = Formatting::new("\n  // keep\n  ");
        assert_eq!(f.reindented("        ").prefix(), "\n  // keep\n        ");
        assert_eq!(Formatting::new(" ").reindented("    ").prefix(), " ");
    }

    #[test]
    fn test_inferred_flag_cleared_by_explicit_prefix() {
        let f = Formatting::infer();
        assert!(f.is_inferred());
        assert!(!f.with_prefix(" ").is_inferred());
    }

    #[test]
    fn test_shift_and_unshift() {
        assert_eq!(shift_lines("a\n  b\nc", "    "), "a\n      b\n    c");
        assert_eq!(unshift_lines("a\n      b\n    c", 4), "a\n  b\nc");
        assert_eq!(unshift_lines("a\n  b", 4), "a\nb");
    }
}
