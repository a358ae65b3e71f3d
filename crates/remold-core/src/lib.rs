//! Remold Core
//!
//! Shared machinery for source-to-source refactoring: lossless trees that
//! print back byte for byte, a flyweight cache of type descriptors, a
//! scope-aware visitor engine, reference resolution, and a driver that runs
//! visitors over single documents or graphs of related documents.
//!
//! Language front-ends live in their own crates and plug in through the
//! [`Language`] and [`Parser`] traits.

pub mod config;
pub mod cursor;
pub mod error;
pub mod formatting;
pub mod grammar;
pub mod graph;
pub mod marker;
pub mod printer;
pub mod refactor;
pub mod resolver;
pub mod result;
pub mod semver;
pub mod tree;
pub mod types;
pub mod validated;
pub mod visitor;

// Re-export commonly used types
pub use config::{ConfigLoader, RecipeConfig, RemoldConfig, VisitorConfig};
pub use cursor::{Binding, Cursor, Scope, locate};
pub use error::{ErrorKind, RemoldError, StructureError};
pub use formatting::Formatting;
pub use grammar::Shape;
pub use graph::{
    DocId, DocumentGraph, GraphEdits, GraphOutcome, GraphVisitor, Property, PropertySource,
    SourceFile, properties_of, resolve_property,
};
pub use marker::{Marker, Markers};
pub use printer::{column_of, print, print_trimmed, resolve_formatting};
pub use refactor::{Change, Failure, FixOutcome, Parser, Refactor, RefactorContext, RefactorVisitor};
pub use resolver::{Reference, ScopeRules, find_references, mark_references, rename};
pub use result::{Result, ResultExt};
pub use semver::{Comparator, Semver, VersionComparator};
pub use tree::{Language, Node, NodeId};
pub use types::{ClassKind, ClassType, Primitive, Type, TypeCache, TypeId};
pub use validated::{Invalid, Validated};
pub use visitor::{Handlers, Remove, Replace, Splice, Visitor, chain, visit, visit_at};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("remold=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
