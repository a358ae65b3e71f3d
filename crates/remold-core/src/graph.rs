//! Document graph
//!
//! Some rewrites cannot be done one tree at a time: a build descriptor may
//! take a value from a property declared in its parent descriptor, which is a
//! separately parsed document. [`DocumentGraph`] holds parsed documents plus
//! their child → parent links, and [`run`] drives a [`GraphVisitor`] over
//! every document with access to the whole graph.
//!
//! Each document's visit is isolated: its edits (to itself or to any ancestor)
//! are committed only if the visit succeeds. A recoverable failure is recorded
//! against that document and the batch carries on.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, warn};

use crate::error::RemoldError;
use crate::result::Result;
use crate::tree::{Language, Node, NodeId};
use crate::visitor::{Visitor, visit};

/// A parsed document and where it came from
#[derive(Debug, Clone)]
pub struct SourceFile<L: Language> {
    pub path: PathBuf,
    pub root: Node<L>,
}

impl<L: Language> SourceFile<L> {
    pub fn new(path: impl Into<PathBuf>, root: Node<L>) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    pub fn print(&self) -> String {
        crate::printer::print(&self.root)
    }
}

/// Handle of a document in a [`DocumentGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(NodeIndex);

/// Documents linked child → parent
#[derive(Debug, Clone)]
pub struct DocumentGraph<L: Language> {
    graph: DiGraph<SourceFile<L>, ()>,
    by_path: IndexMap<PathBuf, DocId>,
}

impl<L: Language> Default for DocumentGraph<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Language> DocumentGraph<L> {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            by_path: IndexMap::new(),
        }
    }

    /// Add a document; a document already registered under the path is replaced
    pub fn add(&mut self, source: SourceFile<L>) -> DocId {
        if let Some(&id) = self.by_path.get(&source.path) {
            self.graph[id.0] = source;
            return id;
        }
        let path = source.path.clone();
        let id = DocId(self.graph.add_node(source));
        self.by_path.insert(path, id);
        id
    }

    /// Link `child` to `parent`, replacing any previous parent
    pub fn set_parent(&mut self, child: DocId, parent: DocId) -> Result<()> {
        if child == parent || has_path_connecting(&self.graph, parent.0, child.0, None) {
            return Err(RemoldError::CyclicParents {
                document: self.document(child).path.clone(),
            });
        }
        let existing: Vec<_> = self
            .graph
            .edges_directed(child.0, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        for edge in existing {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(child.0, parent.0, ());
        Ok(())
    }

    pub fn document(&self, id: DocId) -> &SourceFile<L> {
        &self.graph[id.0]
    }

    pub fn root(&self, id: DocId) -> &Node<L> {
        &self.graph[id.0].root
    }

    pub fn get(&self, path: &Path) -> Option<DocId> {
        self.by_path.get(path).copied()
    }

    pub fn parent_of(&self, id: DocId) -> Option<DocId> {
        self.graph
            .neighbors_directed(id.0, Direction::Outgoing)
            .next()
            .map(DocId)
    }

    /// Parent, grandparent, ... up to the top of the chain
    pub fn ancestors(&self, id: DocId) -> Vec<DocId> {
        std::iter::successors(self.parent_of(id), |&doc| self.parent_of(doc)).collect()
    }

    pub fn children_of(&self, id: DocId) -> Vec<DocId> {
        let mut children: Vec<DocId> = self
            .graph
            .neighbors_directed(id.0, Direction::Incoming)
            .map(DocId)
            .collect();
        children.sort();
        children
    }

    /// Documents in insertion order
    pub fn documents(&self) -> impl Iterator<Item = DocId> + '_ {
        self.by_path.values().copied()
    }

    /// Documents ordered so that parents come before their children
    pub fn parents_first(&self) -> Vec<DocId> {
        match toposort(&self.graph, None) {
            Ok(mut sorted) => {
                sorted.reverse();
                sorted.into_iter().map(DocId).collect()
            }
            // set_parent refuses cycles
            Err(_) => self.documents().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn replace_root(&mut self, id: DocId, root: Node<L>) {
        self.graph[id.0].root = root;
    }
}

/// A named value declared in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    /// Node holding the value text, the place to rewrite it
    pub node: NodeId,
}

/// Extracts property declarations from a document's tree
pub trait PropertySource<L: Language> {
    fn properties(&self, root: &Node<L>) -> Vec<Property>;
}

/// Properties declared directly in a document
pub fn properties_of<L, P>(graph: &DocumentGraph<L>, source: &P, doc: DocId) -> IndexMap<String, Property>
where
    L: Language,
    P: PropertySource<L> + ?Sized,
{
    source
        .properties(graph.root(doc))
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect()
}

/// Find the declaration of `name`, searching `doc` first and then its parents
pub fn resolve_property<L, P>(
    graph: &DocumentGraph<L>,
    source: &P,
    doc: DocId,
    name: &str,
) -> Result<(DocId, Property)>
where
    L: Language,
    P: PropertySource<L> + ?Sized,
{
    std::iter::once(doc)
        .chain(graph.ancestors(doc))
        .find_map(|candidate| {
            source
                .properties(graph.root(candidate))
                .into_iter()
                .find(|p| p.name == name)
                .map(|p| (candidate, p))
        })
        .ok_or_else(|| RemoldError::unresolvable(&graph.document(doc).path, name))
}

/// Pending replacements of document roots during one document's visit
pub struct GraphEdits<L: Language> {
    pending: IndexMap<DocId, Node<L>>,
}

impl<L: Language> GraphEdits<L> {
    fn new() -> Self {
        Self {
            pending: IndexMap::new(),
        }
    }

    /// Current root of `doc`, including edits made so far
    pub fn root(&self, graph: &DocumentGraph<L>, doc: DocId) -> Node<L> {
        self.pending
            .get(&doc)
            .cloned()
            .unwrap_or_else(|| graph.root(doc).clone())
    }

    pub fn replace(&mut self, doc: DocId, root: Node<L>) {
        self.pending.insert(doc, root);
    }

    /// Run a tree visitor over the current root of `doc`
    pub fn apply<V: Visitor<L> + ?Sized>(
        &mut self,
        graph: &DocumentGraph<L>,
        doc: DocId,
        visitor: &mut V,
    ) -> Result<()> {
        let before = self.root(graph, doc);
        let after = visit(visitor, &before)?;
        if !Node::ptr_eq(&before, &after) {
            self.pending.insert(doc, after);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A transformation that may read and write any document of the graph
pub trait GraphVisitor<L: Language> {
    fn name(&self) -> &str;

    fn visit_document(
        &self,
        graph: &DocumentGraph<L>,
        doc: DocId,
        edits: &mut GraphEdits<L>,
    ) -> Result<()>;
}

/// Result of running a [`GraphVisitor`] over a graph
#[derive(Debug)]
pub struct GraphOutcome<L: Language> {
    pub graph: DocumentGraph<L>,
    /// Documents whose tree changed, in the order they first changed
    pub changed: Vec<DocId>,
    /// Documents whose visit failed; their edits were discarded
    pub failures: Vec<(PathBuf, RemoldError)>,
}

/// Visit every document, parents first, committing each visit's edits on success
///
/// Returns an error only for failures that must stop the whole batch.
pub fn run<L, V>(graph: &DocumentGraph<L>, visitor: &V) -> Result<GraphOutcome<L>>
where
    L: Language,
    V: GraphVisitor<L> + ?Sized,
{
    let mut current = graph.clone();
    let mut changed = IndexSet::new();
    let mut failures = Vec::new();

    for doc in graph.parents_first() {
        let mut edits = GraphEdits::new();
        match visitor.visit_document(&current, doc, &mut edits) {
            Ok(()) => {
                for (id, root) in edits.pending {
                    if !Node::ptr_eq(current.root(id), &root) {
                        current.replace_root(id, root);
                        changed.insert(id);
                    }
                }
            }
            Err(err) if err.is_recoverable() => {
                let path = current.document(doc).path.clone();
                warn!("{} failed on '{}': {}", visitor.name(), path.display(), err);
                failures.push((path, err));
            }
            Err(err) => return Err(err),
        }
    }

    debug!(
        "{} changed {} of {} documents",
        visitor.name(),
        changed.len(),
        graph.len()
    );
    Ok(GraphOutcome {
        graph: current,
        changed: changed.into_iter().collect(),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resolver::rename_tokens;
    use crate::tree::testing::{Kind, Sexp, parse};

    /// `(name value)` pairs at the top level are properties
    struct Pairs;

    impl PropertySource<Sexp> for Pairs {
        fn properties(&self, root: &Node<Sexp>) -> Vec<Property> {
            root.children_of(Kind::List)
                .filter_map(|pair| {
                    let atoms: Vec<_> = pair.children_of(Kind::Atom).collect();
                    match atoms.as_slice() {
                        [name, value] => Some(Property {
                            name: name.text()?.to_string(),
                            value: value.text()?.to_string(),
                            node: value.id(),
                        }),
                        _ => None,
                    }
                })
                .collect()
        }
    }

    fn family() -> (DocumentGraph<Sexp>, DocId, DocId) {
        let mut graph = DocumentGraph::new();
        let parent = graph.add(SourceFile::new("parent", parse("((v 1) (w 2))")));
        let child = graph.add(SourceFile::new("child", parse("((w 3))")));
        graph.set_parent(child, parent).unwrap();
        (graph, parent, child)
    }

    #[test]
    fn test_links() {
        let (mut graph, parent, child) = family();
        assert_eq!(graph.parent_of(child), Some(parent));
        assert_eq!(graph.ancestors(child), vec![parent]);
        assert_eq!(graph.children_of(parent), vec![child]);
        assert_eq!(graph.parents_first(), vec![parent, child]);

        let err = graph.set_parent(parent, child).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Graph);
    }

    #[test]
    fn test_resolve_local_then_parent() {
        let (graph, parent, child) = family();
        let (found, w) = resolve_property(&graph, &Pairs, child, "w").unwrap();
        assert_eq!((found, w.value.as_str()), (child, "3"));
        let (found, v) = resolve_property(&graph, &Pairs, child, "v").unwrap();
        assert_eq!((found, v.value.as_str()), (parent, "1"));

        let err = resolve_property(&graph, &Pairs, child, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvableTarget);
        assert_eq!(properties_of(&graph, &Pairs, parent).len(), 2);
    }

    /// Sets property `v` wherever it is declared
    struct SetV(&'static str);

    impl GraphVisitor<Sexp> for SetV {
        fn name(&self) -> &str {
            "set-v"
        }

        fn visit_document(
            &self,
            graph: &DocumentGraph<Sexp>,
            doc: DocId,
            edits: &mut GraphEdits<Sexp>,
        ) -> Result<()> {
            let (owner, property) = resolve_property(graph, &Pairs, doc, "v")?;
            let root = edits.root(graph, owner);
            let targets = [property.node].into_iter().collect();
            edits.replace(owner, rename_tokens(&root, &targets, self.0)?);
            Ok(())
        }
    }

    #[test]
    fn test_run_rewrites_parent_declaration() {
        let (graph, parent, child) = family();
        let outcome = run(&graph, &SetV("9")).unwrap();
        assert_eq!(outcome.changed, vec![parent]);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.graph.document(parent).print(), "((v 9) (w 2))");
        assert_eq!(outcome.graph.document(child).print(), "((w 3))");
        // the input graph is untouched
        assert_eq!(graph.document(parent).print(), "((v 1) (w 2))");
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut graph = DocumentGraph::new();
        let orphan = graph.add(SourceFile::new("orphan", parse("((w 1))")));
        let ok = graph.add(SourceFile::new("ok", parse("((v 1))")));
        let outcome = run(&graph, &SetV("2")).unwrap();
        assert_eq!(outcome.changed, vec![ok]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, PathBuf::from("orphan"));
        assert_eq!(outcome.graph.document(orphan).print(), "((w 1))");
    }
}
