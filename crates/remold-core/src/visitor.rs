//! Visitor engine
//!
//! The engine walks a tree depth first. For every node it first calls
//! [`Visitor::enter`] (pre-order, where scope bookkeeping happens), then
//! visits and possibly replaces each child, then offers the node itself to
//! [`Visitor::visit`]. A branch is rebuilt only when one of its children came
//! back as a different node; otherwise the original value is handed on, so
//! untouched subtrees stay shared with the input tree.
//!
//! Rebuilding re-checks the grammar, so a handler that puts a node of the
//! wrong kind into a slot fails the run with a structural error right where
//! the replacement is composed.
//!
//! The input tree is never modified and remains printable after any number
//! of runs.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::debug;

use crate::cursor::{Cursor, locate};
use crate::error::{RemoldError, StructureError};
use crate::result::Result;
use crate::tree::{Language, Node, NodeId};

/// A tree transformation
pub trait Visitor<L: Language> {
    /// Called before the node's children are visited
    fn enter(&mut self, _cursor: &Cursor<L>) -> Result<()> {
        Ok(())
    }

    /// Called after the children; `node` already carries the rewritten children
    fn visit(&mut self, node: Node<L>, _cursor: &Cursor<L>) -> Result<Node<L>> {
        Ok(node)
    }
}

impl<L: Language, V: Visitor<L> + ?Sized> Visitor<L> for &mut V {
    fn enter(&mut self, cursor: &Cursor<L>) -> Result<()> {
        (**self).enter(cursor)
    }

    fn visit(&mut self, node: Node<L>, cursor: &Cursor<L>) -> Result<Node<L>> {
        (**self).visit(node, cursor)
    }
}

/// Run `visitor` over the whole tree
pub fn visit<L: Language, V: Visitor<L> + ?Sized>(visitor: &mut V, root: &Node<L>) -> Result<Node<L>> {
    walk(visitor, &Cursor::root(root.clone()))
}

/// Run `visitor` over the subtree rooted at `target` only
///
/// The cursor handed to the visitor still sees every ancestor of `target`,
/// though their scopes are empty. Returns the whole rewritten tree; if no node
/// has the given id the tree is returned unchanged.
pub fn visit_at<L: Language, V: Visitor<L> + ?Sized>(
    visitor: &mut V,
    root: &Node<L>,
    target: NodeId,
) -> Result<Node<L>> {
    let Some(cursor) = locate(root, target) else {
        return Ok(root.clone());
    };
    let replacement = walk(visitor, &cursor)?;
    if Node::ptr_eq(&replacement, cursor.node()) {
        return Ok(root.clone());
    }
    cursor.replace(replacement)
}

/// Run visitors in order, each over the output of the previous one
pub fn chain<L: Language>(visitors: &mut [&mut dyn Visitor<L>], root: &Node<L>) -> Result<Node<L>> {
    let started = Instant::now();
    let mut current = root.clone();
    for visitor in visitors.iter_mut() {
        current = visit(&mut **visitor, &current)?;
    }
    debug!(
        "Ran {} visitors in {:?}",
        visitors.len(),
        started.elapsed()
    );
    Ok(current)
}

fn walk<L: Language, V: Visitor<L> + ?Sized>(visitor: &mut V, cursor: &Cursor<L>) -> Result<Node<L>> {
    visitor.enter(cursor)?;
    let node = cursor.node().clone();
    let mut changed = false;
    let mut children = Vec::with_capacity(node.children().len());
    for child in node.children() {
        let visited = walk(visitor, &cursor.push(child.clone()))?;
        changed |= !Node::ptr_eq(&visited, child);
        children.push(visited);
    }
    let node = if changed {
        node.with_children(children)?
    } else {
        node
    };
    visitor.visit(node, cursor)
}

type Handler<'h, L> = Box<dyn FnMut(Node<L>, &Cursor<L>) -> Result<Node<L>> + 'h>;

/// A visitor assembled from per-kind handler functions
///
/// Several handlers may be registered for one kind; they run in
/// registration order, each seeing the previous one's output.
pub struct Handlers<'h, L: Language> {
    handlers: HashMap<L::Kind, Vec<Handler<'h, L>>>,
}

impl<'h, L: Language> Default for Handlers<'h, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h, L: Language> Handlers<'h, L> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn on(
        mut self,
        kind: L::Kind,
        handler: impl FnMut(Node<L>, &Cursor<L>) -> Result<Node<L>> + 'h,
    ) -> Self {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }
}

impl<L: Language> Visitor<L> for Handlers<'_, L> {
    fn visit(&mut self, mut node: Node<L>, cursor: &Cursor<L>) -> Result<Node<L>> {
        if let Some(handlers) = self.handlers.get_mut(&node.kind()) {
            for handler in handlers.iter_mut() {
                node = handler(node, cursor)?;
            }
        }
        Ok(node)
    }
}

/// Insert nodes into a branch at a child index
#[derive(Debug, Clone)]
pub struct Splice<L: Language> {
    parent: NodeId,
    index: Option<usize>,
    nodes: Vec<Node<L>>,
}

impl<L: Language> Splice<L> {
    /// Insert at `index` among the children of `parent`
    pub fn at(parent: NodeId, index: usize, nodes: Vec<Node<L>>) -> Self {
        Self {
            parent,
            index: Some(index),
            nodes,
        }
    }

    /// Insert after the last child of `parent`
    pub fn append(parent: NodeId, nodes: Vec<Node<L>>) -> Self {
        Self {
            parent,
            index: None,
            nodes,
        }
    }

    /// Insert before the node the anchor cursor points at
    pub fn before(anchor: &Cursor<L>, nodes: Vec<Node<L>>) -> Result<Self> {
        let (parent, index) = anchor_position(anchor)?;
        Ok(Self::at(parent, index, nodes))
    }

    /// Insert after the node the anchor cursor points at
    pub fn after(anchor: &Cursor<L>, nodes: Vec<Node<L>>) -> Result<Self> {
        let (parent, index) = anchor_position(anchor)?;
        Ok(Self::at(parent, index + 1, nodes))
    }
}

fn anchor_position<L: Language>(anchor: &Cursor<L>) -> Result<(NodeId, usize)> {
    let parent = anchor
        .parent_node()
        .ok_or_else(|| RemoldError::visitor_error("splice", "cannot insert next to the root"))?;
    let index = anchor
        .index_in_parent()
        .ok_or_else(|| RemoldError::visitor_error("splice", "anchor is not a child of its parent"))?;
    Ok((parent.id(), index))
}

impl<L: Language> Visitor<L> for Splice<L> {
    fn visit(&mut self, node: Node<L>, _cursor: &Cursor<L>) -> Result<Node<L>> {
        if node.id() != self.parent || self.nodes.is_empty() {
            return Ok(node);
        }
        let mut children = node.children().to_vec();
        let index = self.index.unwrap_or(children.len());
        if index > children.len() {
            return Err(StructureError::new(
                format!("{:?}", node.kind()),
                index,
                format!("insertion index at most {}", children.len()),
                "out of range index",
            )
            .into());
        }
        children.splice(index..index, self.nodes.iter().cloned());
        Ok(node.with_children(children)?)
    }
}

/// Replace nodes by id
#[derive(Debug, Clone)]
pub struct Replace<L: Language> {
    replacements: HashMap<NodeId, Node<L>>,
}

impl<L: Language> Default for Replace<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Language> Replace<L> {
    pub fn new() -> Self {
        Self {
            replacements: HashMap::new(),
        }
    }

    pub fn with(mut self, target: NodeId, replacement: Node<L>) -> Self {
        self.replacements.insert(target, replacement);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}

impl<L: Language> Visitor<L> for Replace<L> {
    fn visit(&mut self, node: Node<L>, _cursor: &Cursor<L>) -> Result<Node<L>> {
        Ok(self.replacements.get(&node.id()).cloned().unwrap_or(node))
    }
}

/// Drop nodes by id from whatever branch holds them
#[derive(Debug, Clone, Default)]
pub struct Remove {
    targets: HashSet<NodeId>,
}

impl Remove {
    pub fn new(targets: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }
}

impl<L: Language> Visitor<L> for Remove {
    fn visit(&mut self, node: Node<L>, _cursor: &Cursor<L>) -> Result<Node<L>> {
        if !node.children().iter().any(|c| self.targets.contains(&c.id())) {
            return Ok(node);
        }
        let children = node
            .children()
            .iter()
            .filter(|c| !self.targets.contains(&c.id()))
            .cloned()
            .collect();
        Ok(node.with_children(children)?)
    }
}
