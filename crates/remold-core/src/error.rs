//! Error types for parsing, visiting, and rewriting source trees

use std::path::PathBuf;
use thiserror::Error;

use crate::validated::Invalid;

/// A visitor tried to place a node of the wrong kind into a grammar slot.
///
/// Raised when the replacement node is constructed, never deferred to the
/// printer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{node} cannot hold {found} at child {position}: expected {expected}")]
pub struct StructureError {
    /// Kind of the branch being constructed
    pub node: String,
    /// Index of the offending child (or the child count when one is missing)
    pub position: usize,
    /// What the grammar slot accepts
    pub expected: String,
    /// What was supplied instead
    pub found: String,
}

impl StructureError {
    pub fn new(
        node: impl Into<String>,
        position: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Main error type for refactoring operations
#[derive(Debug, Error)]
pub enum RemoldError {
    /// Structural-validity error, fatal to the visitor run that caused it
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// A rewrite target could not be found anywhere in the document graph
    #[error(
        "Unresolvable target: property '{property}' is not declared in '{}' or any of its parents",
        document.display()
    )]
    UnresolvableTarget { document: PathBuf, property: String },

    /// Front-end could not produce a tree
    #[error("Parse error in '{}' at offset {offset}: {message}", path.display())]
    Parse {
        path: PathBuf,
        offset: usize,
        message: String,
    },

    /// Recipe configuration loading or mapping errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File system I/O errors
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Visitor options failed validation
    #[error("Invalid options: {}", format_failures(.failures))]
    Validation { failures: Vec<Invalid> },

    /// A visitor reported a failure of its own
    #[error("Visitor '{visitor}' failed: {message}")]
    Visitor { visitor: String, message: String },

    /// Parent links between documents form a cycle
    #[error("Cyclic parent chain involving '{}'", document.display())]
    CyclicParents { document: PathBuf },
}

fn format_failures(failures: &[Invalid]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structure,
    UnresolvableTarget,
    Parse,
    Config,
    Io,
    Validation,
    Visitor,
    Graph,
}

impl RemoldError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoldError::Structure(_) => ErrorKind::Structure,
            RemoldError::UnresolvableTarget { .. } => ErrorKind::UnresolvableTarget,
            RemoldError::Parse { .. } => ErrorKind::Parse,
            RemoldError::Config { .. } => ErrorKind::Config,
            RemoldError::Io { .. } => ErrorKind::Io,
            RemoldError::Validation { .. } => ErrorKind::Validation,
            RemoldError::Visitor { .. } => ErrorKind::Visitor,
            RemoldError::CyclicParents { .. } => ErrorKind::Graph,
        }
    }

    /// Whether the rest of a batch can continue after this error
    ///
    /// Errors tied to a single document abort only that document's rewrite.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Structure
                | ErrorKind::UnresolvableTarget
                | ErrorKind::Parse
                | ErrorKind::Visitor
        )
    }

    /// Create a parse error
    pub fn parse_error(path: impl Into<PathBuf>, offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            offset,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unresolvable-target error
    pub fn unresolvable(document: impl Into<PathBuf>, property: impl Into<String>) -> Self {
        Self::UnresolvableTarget {
            document: document.into(),
            property: property.into(),
        }
    }

    /// Create a visitor error
    pub fn visitor_error(visitor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Visitor {
            visitor: visitor.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_error_message() {
        let err = StructureError::new("If", 2, "statement", "Import");
        assert_eq!(
            err.to_string(),
            "If cannot hold Import at child 2: expected statement"
        );
    }

    #[test]
    fn test_error_kinds() {
        let err: RemoldError = StructureError::new("Block", 0, "'{'", "Ident").into();
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert!(err.is_recoverable());

        let err = RemoldError::config_error("missing recipe");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!err.is_recoverable());

        let err = RemoldError::unresolvable("pom.xml", "guava.version");
        assert!(err.to_string().contains("guava.version"));
        assert!(err.to_string().contains("pom.xml"));
    }
}
