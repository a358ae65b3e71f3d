//! Multi-cycle refactoring driver
//!
//! A [`Refactor`] holds an ordered list of [`RefactorVisitor`]s and applies
//! them to a batch of source files. Visitors run in cycles: one visitor's
//! change may enable another's, so the whole list is run again (at most
//! `max_cycles` times) until a cycle changes nothing. Visitors that are not
//! idempotent only take part in the first cycle.
//!
//! A visitor may queue follow-up visitors through
//! [`RefactorContext::and_then`]; they run right after it, on its output.
//!
//! Failures are tied to a document: a recoverable error aborts that
//! document's rewrite and is reported, while the other documents of the batch
//! are still processed.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexSet;
use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::error::RemoldError;
use crate::graph::SourceFile;
use crate::printer::print;
use crate::result::Result;
use crate::tree::{Language, Node};
use crate::validated::Validated;

/// Front-end turning text into trees
pub trait Parser<L: Language> {
    fn parse_str(&self, path: &Path, text: &str) -> Result<SourceFile<L>>;

    /// Parse several inputs; front-ends that attribute across files override this
    fn parse_all(&self, inputs: &[(PathBuf, String)]) -> Result<Vec<SourceFile<L>>> {
        inputs
            .iter()
            .map(|(path, text)| self.parse_str(path, text))
            .collect()
    }

    fn parse_path(&self, path: &Path) -> Result<SourceFile<L>> {
        let text =
            std::fs::read_to_string(path).map_err(|e| RemoldError::io_error(path, e))?;
        self.parse_str(path, &text)
    }
}

/// A named, configured transformation of one source file
pub trait RefactorVisitor<L: Language> {
    fn name(&self) -> String;

    /// Whether running the visitor again on its own output changes nothing
    fn is_idempotent(&self) -> bool {
        true
    }

    fn validate(&self) -> Validated {
        Validated::none()
    }

    fn refactor(&self, source: &SourceFile<L>, ctx: &mut RefactorContext<L>) -> Result<Node<L>>;
}

/// Per-run state handed to a visitor
pub struct RefactorContext<L: Language> {
    cycle: usize,
    and_then: Vec<Box<dyn RefactorVisitor<L>>>,
}

impl<L: Language> RefactorContext<L> {
    fn new(cycle: usize) -> Self {
        Self {
            cycle,
            and_then: Vec::new(),
        }
    }

    /// Zero-based cycle number
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Queue a visitor to run after the current one
    pub fn and_then(&mut self, visitor: impl RefactorVisitor<L> + 'static) {
        self.and_then.push(Box::new(visitor));
    }
}

/// A document that came out different
#[derive(Debug, Clone)]
pub struct Change<L: Language> {
    pub path: PathBuf,
    pub original: Node<L>,
    pub fixed: Node<L>,
    /// Names of the visitors that changed the document, in first-change order
    pub visitors: Vec<String>,
}

impl<L: Language> Change<L> {
    pub fn fixed_text(&self) -> String {
        print(&self.fixed)
    }

    /// Unified diff from the original to the fixed text
    pub fn diff(&self) -> String {
        let before = print(&self.original);
        let after = print(&self.fixed);
        let path = self.path.display().to_string();
        TextDiff::from_lines(&before, &after)
            .unified_diff()
            .context_radius(3)
            .header(&path, &path)
            .to_string()
    }
}

/// A document whose rewrite was abandoned
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub visitor: String,
    pub error: RemoldError,
}

#[derive(Debug)]
pub struct FixOutcome<L: Language> {
    pub changes: Vec<Change<L>>,
    pub failures: Vec<Failure>,
}

/// An ordered set of visitors applied to source files
pub struct Refactor<L: Language> {
    visitors: Vec<Box<dyn RefactorVisitor<L>>>,
    max_cycles: usize,
}

impl<L: Language> Default for Refactor<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Language> Refactor<L> {
    pub const DEFAULT_MAX_CYCLES: usize = 3;

    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
            max_cycles: Self::DEFAULT_MAX_CYCLES,
        }
    }

    pub fn visit(mut self, visitor: impl RefactorVisitor<L> + 'static) -> Self {
        self.visitors.push(Box::new(visitor));
        self
    }

    pub fn visit_boxed(mut self, visitor: Box<dyn RefactorVisitor<L>>) -> Self {
        self.visitors.push(visitor);
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles.max(1);
        self
    }

    pub fn validate(&self) -> Validated {
        self.visitors
            .iter()
            .fold(Validated::none(), |acc, v| acc.and(v.validate()))
    }

    /// Apply all visitors to every source
    ///
    /// Invalid visitor options fail the whole batch before any source is touched.
    pub fn fix(&self, sources: &[SourceFile<L>]) -> Result<FixOutcome<L>> {
        self.validate().into_result()?;
        let started = Instant::now();
        let mut changes = Vec::new();
        let mut failures = Vec::new();

        for source in sources {
            match self.fix_one(source) {
                Ok(Some(change)) => changes.push(change),
                Ok(None) => {}
                Err((visitor, error)) if error.is_recoverable() => {
                    warn!(
                        "Skipping '{}': {} failed: {}",
                        source.path.display(),
                        visitor,
                        error
                    );
                    failures.push(Failure {
                        path: source.path.clone(),
                        visitor,
                        error,
                    });
                }
                Err((_, error)) => return Err(error),
            }
        }

        info!(
            "Refactored {} of {} sources in {:?}",
            changes.len(),
            sources.len(),
            started.elapsed()
        );
        Ok(FixOutcome { changes, failures })
    }

    fn fix_one(&self, source: &SourceFile<L>) -> std::result::Result<Option<Change<L>>, (String, RemoldError)> {
        let mut current = source.clone();
        let mut names = IndexSet::new();

        for cycle in 0..self.max_cycles {
            let mut changed = false;
            for visitor in &self.visitors {
                if cycle > 0 && !visitor.is_idempotent() {
                    continue;
                }
                changed |= run_visitor(visitor.as_ref(), &mut current, cycle, &mut names)?;
            }
            debug!(
                "Cycle {} on '{}' {}",
                cycle,
                source.path.display(),
                if changed { "changed the tree" } else { "was stable" }
            );
            if !changed {
                break;
            }
        }

        if Node::ptr_eq(&current.root, &source.root) {
            return Ok(None);
        }
        Ok(Some(Change {
            path: source.path.clone(),
            original: source.root.clone(),
            fixed: current.root,
            visitors: names.into_iter().collect(),
        }))
    }
}

/// Run one visitor and its follow-ups, returning whether the tree changed
fn run_visitor<L: Language>(
    visitor: &dyn RefactorVisitor<L>,
    current: &mut SourceFile<L>,
    cycle: usize,
    names: &mut IndexSet<String>,
) -> std::result::Result<bool, (String, RemoldError)> {
    let mut ctx = RefactorContext::new(cycle);
    let after = visitor
        .refactor(current, &mut ctx)
        .map_err(|e| (visitor.name(), e))?;
    let mut changed = false;
    if !Node::ptr_eq(&after, &current.root) {
        names.insert(visitor.name());
        current.root = after;
        changed = true;
    }
    for follow_up in ctx.and_then {
        changed |= run_visitor(follow_up.as_ref(), current, cycle, names)?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::cursor::Cursor;
    use crate::error::{ErrorKind, StructureError};
    use crate::tree::testing::{Kind, Sexp, parse};
    use crate::visitor::{Handlers, visit};

    /// Rewrites atom `from` to `to`
    struct Swap {
        from: &'static str,
        to: &'static str,
        runs: Rc<Cell<usize>>,
        idempotent: bool,
    }

    impl Swap {
        fn new(from: &'static str, to: &'static str) -> Self {
            Self {
                from,
                to,
                runs: Rc::new(Cell::new(0)),
                idempotent: true,
            }
        }
    }

    impl RefactorVisitor<Sexp> for Swap {
        fn name(&self) -> String {
            format!("swap-{}-{}", self.from, self.to)
        }

        fn is_idempotent(&self) -> bool {
            self.idempotent
        }

        fn refactor(&self, source: &SourceFile<Sexp>, _ctx: &mut RefactorContext<Sexp>) -> Result<Node<Sexp>> {
            self.runs.set(self.runs.get() + 1);
            let mut handlers = Handlers::new().on(Kind::Atom, |n: Node<Sexp>, _: &Cursor<Sexp>| {
                if n.text() == Some(self.from) {
                    Ok(n.with_text(self.to)?)
                } else {
                    Ok(n)
                }
            });
            visit(&mut handlers, &source.root)
        }
    }

    struct Fails;

    impl RefactorVisitor<Sexp> for Fails {
        fn name(&self) -> String {
            "fails".into()
        }

        fn refactor(&self, source: &SourceFile<Sexp>, _ctx: &mut RefactorContext<Sexp>) -> Result<Node<Sexp>> {
            if source.path == Path::new("bad") {
                Err(RemoldError::visitor_error("fails", "boom"))
            } else if source.path == Path::new("ill-formed") {
                Err(StructureError::new("List", 0, "atom", "List").into())
            } else {
                Ok(source.root.clone())
            }
        }
    }

    struct Chained;

    impl RefactorVisitor<Sexp> for Chained {
        fn name(&self) -> String {
            "chained".into()
        }

        fn refactor(&self, source: &SourceFile<Sexp>, ctx: &mut RefactorContext<Sexp>) -> Result<Node<Sexp>> {
            ctx.and_then(Swap::new("a", "b"));
            Ok(source.root.clone())
        }
    }

    fn sources(texts: &[(&str, &str)]) -> Vec<SourceFile<Sexp>> {
        texts
            .iter()
            .map(|(path, text)| SourceFile::new(*path, parse(text)))
            .collect()
    }

    #[test]
    fn test_later_cycle_picks_up_enabled_change() {
        // b -> c only applies after a -> b ran, which comes later in the list
        let refactor = Refactor::new().visit(Swap::new("b", "c")).visit(Swap::new("a", "b"));
        let outcome = refactor.fix(&sources(&[("x", "(a)")])).unwrap();
        assert_eq!(outcome.changes.len(), 1);
        let change = &outcome.changes[0];
        assert_eq!(change.fixed_text(), "(c)");
        assert_eq!(change.visitors, vec!["swap-a-b", "swap-b-c"]);
        assert!(change.diff().contains("-(a)"));
        assert!(change.diff().contains("+(c)"));
    }

    #[test]
    fn test_non_idempotent_runs_once() {
        let mut swap = Swap::new("a", "b");
        swap.idempotent = false;
        let runs = Rc::clone(&swap.runs);
        let refactor = Refactor::new().visit(swap).visit(Swap::new("z", "y"));
        refactor.fix(&sources(&[("x", "(a z)")])).unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_stops_when_stable() {
        let swap = Swap::new("q", "r");
        let runs = Rc::clone(&swap.runs);
        let outcome = Refactor::new().visit(swap).fix(&sources(&[("x", "(a)")])).unwrap();
        assert!(outcome.changes.is_empty());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_failure_leaves_other_documents() {
        let refactor = Refactor::new().visit(Swap::new("a", "b")).visit(Fails);
        let outcome = refactor
            .fix(&sources(&[("bad", "(a)"), ("good", "(a)")]))
            .unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].visitor, "fails");
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].path, PathBuf::from("good"));
    }

    #[test]
    fn test_structure_error_leaves_other_documents() {
        let refactor = Refactor::new().visit(Fails).visit(Swap::new("a", "b"));
        let outcome = refactor
            .fix(&sources(&[("ill-formed", "(a)"), ("good", "(a)")]))
            .unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].error.kind(), ErrorKind::Structure);
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].path, PathBuf::from("good"));
    }

    #[test]
    fn test_and_then_runs_follow_up() {
        let outcome = Refactor::new()
            .visit(Chained)
            .fix(&sources(&[("x", "(a)")]))
            .unwrap();
        assert_eq!(outcome.changes[0].fixed_text(), "(b)");
        assert_eq!(outcome.changes[0].visitors, vec!["swap-a-b"]);
    }
}
