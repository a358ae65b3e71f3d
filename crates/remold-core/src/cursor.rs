//! Ancestor-chain traversal context
//!
//! A [`Cursor`] points at one node and links up through every ancestor to the
//! root. Each link owns a [`Scope`] of names declared while descending through
//! that ancestor, which is what the resolver searches innermost-first.
//!
//! Cursors are cheap to clone (reference counted) and belong to a single
//! traversal; they are deliberately not `Send`.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::RemoldError;
use crate::result::Result;
use crate::tree::{Language, Node, NodeId};
use crate::types::TypeId;

/// What a declared name is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub decl: NodeId,
    pub ty: Option<TypeId>,
}

/// Names declared directly in one lexical scope
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: IndexMap<String, Binding>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

struct Frame<L: Language> {
    node: Node<L>,
    parent: Option<Rc<Frame<L>>>,
    scope: RefCell<Scope>,
}

/// A node together with its path to the root
pub struct Cursor<L: Language> {
    frame: Rc<Frame<L>>,
}

impl<L: Language> Clone for Cursor<L> {
    fn clone(&self) -> Self {
        Self {
            frame: Rc::clone(&self.frame),
        }
    }
}

impl<L: Language> Cursor<L> {
    pub fn root(node: Node<L>) -> Self {
        Self {
            frame: Rc::new(Frame {
                node,
                parent: None,
                scope: RefCell::new(Scope::default()),
            }),
        }
    }

    /// Cursor for a child of the current node
    pub fn push(&self, node: Node<L>) -> Self {
        Self {
            frame: Rc::new(Frame {
                node,
                parent: Some(Rc::clone(&self.frame)),
                scope: RefCell::new(Scope::default()),
            }),
        }
    }

    pub fn node(&self) -> &Node<L> {
        &self.frame.node
    }

    pub fn parent(&self) -> Option<Cursor<L>> {
        self.frame.parent.as_ref().map(|frame| Cursor {
            frame: Rc::clone(frame),
        })
    }

    pub fn parent_node(&self) -> Option<&Node<L>> {
        self.frame.parent.as_ref().map(|frame| &frame.node)
    }

    pub fn is_root(&self) -> bool {
        self.frame.parent.is_none()
    }

    /// Number of ancestors above the current node
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// The current node's position among its parent's children
    pub fn index_in_parent(&self) -> Option<usize> {
        self.parent_node()?.index_of(self.node().id())
    }

    /// Cursors from the parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = Cursor<L>> {
        std::iter::successors(self.parent(), Cursor::parent)
    }

    /// This cursor followed by its ancestors
    pub fn path(&self) -> impl Iterator<Item = Cursor<L>> {
        std::iter::successors(Some(self.clone()), Cursor::parent)
    }

    /// Nearest strict ancestor whose kind satisfies `accepts`
    pub fn enclosing(&self, accepts: impl Fn(L::Kind) -> bool) -> Option<Cursor<L>> {
        self.ancestors().find(|c| accepts(c.node().kind()))
    }

    /// Bind `name` in this node's scope, shadowing outer bindings
    pub fn declare(&self, name: impl Into<String>, binding: Binding) {
        self.frame
            .scope
            .borrow_mut()
            .bindings
            .insert(name.into(), binding);
    }

    /// Resolve `name` through the scope chain, innermost first
    pub fn resolve(&self, name: &str) -> Option<Binding> {
        self.path().find_map(|c| c.frame.scope.borrow().get(name))
    }

    /// Snapshot of this node's own scope
    pub fn scope(&self) -> Scope {
        self.frame.scope.borrow().clone()
    }

    /// Rebuild the root with the current node replaced by `replacement`
    ///
    /// Every ancestor is re-checked against the grammar on the way up.
    pub fn replace(&self, replacement: Node<L>) -> Result<Node<L>> {
        let mut current = replacement;
        let mut cursor = self.clone();
        while let Some(parent) = cursor.parent() {
            let index = cursor.index_in_parent().ok_or_else(|| {
                RemoldError::visitor_error("cursor", "node is no longer a child of its parent")
            })?;
            current = parent.node().with_child(index, current)?;
            cursor = parent;
        }
        Ok(current)
    }
}

/// Cursor pointing at the node with `id`, with scopes left empty
pub fn locate<L: Language>(root: &Node<L>, id: NodeId) -> Option<Cursor<L>> {
    fn search<L: Language>(cursor: Cursor<L>, id: NodeId) -> Option<Cursor<L>> {
        if cursor.node().id() == id {
            return Some(cursor);
        }
        let children = cursor.node().children().to_vec();
        children
            .into_iter()
            .find_map(|child| search(cursor.push(child), id))
    }
    search(Cursor::root(root.clone()), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testing::{Kind, parse};

    #[test]
    fn test_innermost_binding_wins() {
        let tree = parse("(a (b))");
        let outer = Cursor::root(tree.clone());
        let inner = outer.push(tree.children()[2].clone());
        let (x, y) = (NodeId::fresh(), NodeId::fresh());
        outer.declare("n", Binding { decl: x, ty: None });
        assert_eq!(inner.resolve("n").map(|b| b.decl), Some(x));
        inner.declare("n", Binding { decl: y, ty: None });
        assert_eq!(inner.resolve("n").map(|b| b.decl), Some(y));
        assert_eq!(outer.resolve("n").map(|b| b.decl), Some(x));
        assert!(inner.resolve("m").is_none());
    }

    #[test]
    fn test_locate_and_replace() {
        let tree = parse("(a (b c) d)");
        let c = tree
            .descendants()
            .find(|n| n.text() == Some("c"))
            .unwrap()
            .clone();
        let cursor = locate(&tree, c.id()).unwrap();
        assert_eq!(cursor.depth(), 2);
        assert_eq!(cursor.index_in_parent(), Some(2));
        assert!(cursor.enclosing(|k| k == Kind::List).is_some());

        let root = cursor.replace(c.with_text("z").unwrap()).unwrap();
        assert_eq!(root.to_string(), "(a (b z) d)");
        assert_eq!(root.id(), tree.id());
    }
}
