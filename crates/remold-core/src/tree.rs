//! Lossless tree nodes
//!
//! A [`Node`] is either a *token* (a leaf holding source text) or a *branch*
//! (an ordered list of child nodes). Every node carries its own
//! [`Formatting`], so printing a tree that was never edited reproduces the
//! input byte for byte.
//!
//! Nodes are immutable and reference counted. Every `with_*` method returns a
//! new node value; children that were not replaced are shared with the
//! original tree, not copied. The original tree stays valid and printable.
//!
//! Each language plugs its closed set of node kinds in through the
//! [`Language`] trait, whose `check` function is the grammar-slot validator
//! run whenever a branch is built.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::StructureError;
use crate::formatting::Formatting;
use crate::marker::{Marker, Markers};
use crate::types::TypeId;

/// A grammar: a closed set of node kinds plus the rules for what each branch
/// may contain
pub trait Language: Sized + Copy + fmt::Debug + Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Validate the children of a branch of `kind`
    fn check(kind: Self::Kind, children: &[Node<Self>]) -> Result<(), StructureError>;
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, opaque node identity
///
/// Ids are handed out by the front-end when a node is created and survive
/// `with_*` edits, so a rewritten node can still be matched to the node it
/// came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate an id that no other node has
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

enum Content<L: Language> {
    Token(String),
    Branch(Vec<Node<L>>),
}

struct NodeData<L: Language> {
    id: NodeId,
    kind: L::Kind,
    formatting: Formatting,
    content: Content<L>,
    ty: Option<TypeId>,
    markers: Markers,
}

/// A node of a lossless tree
pub struct Node<L: Language> {
    data: Arc<NodeData<L>>,
}

impl<L: Language> Clone for Node<L> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<L: Language> Node<L> {
    /// Create a leaf holding `text`
    pub fn token(kind: L::Kind, formatting: Formatting, text: impl Into<String>) -> Self {
        Self::from_data(NodeData {
            id: NodeId::fresh(),
            kind,
            formatting,
            content: Content::Token(text.into()),
            ty: None,
            markers: Markers::new(),
        })
    }

    /// Create a branch, validating the children against the grammar
    pub fn branch(
        kind: L::Kind,
        formatting: Formatting,
        children: Vec<Node<L>>,
    ) -> Result<Self, StructureError> {
        L::check(kind, &children)?;
        Ok(Self::from_data(NodeData {
            id: NodeId::fresh(),
            kind,
            formatting,
            content: Content::Branch(children),
            ty: None,
            markers: Markers::new(),
        }))
    }

    /// Create a branch that takes over the leading prefix of its first child
    ///
    /// Front-ends attach trivia to the token that follows it; enclosing lifts
    /// it to the outermost node starting at that token so that replacing the
    /// node can keep its formatting.
    pub fn enclose(kind: L::Kind, mut children: Vec<Node<L>>) -> Result<Self, StructureError> {
        let formatting = match children.first_mut() {
            Some(first) => {
                let lifted = first.formatting().with_suffix("");
                *first = first.with_formatting(Formatting::EMPTY.with_suffix(first.suffix()));
                lifted
            }
            None => Formatting::EMPTY,
        };
        Self::branch(kind, formatting, children)
    }

    fn from_data(data: NodeData<L>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    fn rebuild(&self, f: impl FnOnce(&mut NodeData<L>)) -> Self {
        let mut data = NodeData {
            id: self.data.id,
            kind: self.data.kind,
            formatting: self.data.formatting.clone(),
            content: match &self.data.content {
                Content::Token(text) => Content::Token(text.clone()),
                Content::Branch(children) => Content::Branch(children.clone()),
            },
            ty: self.data.ty,
            markers: self.data.markers.clone(),
        };
        f(&mut data);
        Self::from_data(data)
    }

    pub fn id(&self) -> NodeId {
        self.data.id
    }

    pub fn kind(&self) -> L::Kind {
        self.data.kind
    }

    pub fn formatting(&self) -> &Formatting {
        &self.data.formatting
    }

    pub fn prefix(&self) -> &str {
        self.data.formatting.prefix()
    }

    pub fn suffix(&self) -> &str {
        self.data.formatting.suffix()
    }

    /// Attached type, if attribution assigned one
    pub fn ty(&self) -> Option<TypeId> {
        self.data.ty
    }

    pub fn markers(&self) -> &Markers {
        &self.data.markers
    }

    pub fn is_token(&self) -> bool {
        matches!(self.data.content, Content::Token(_))
    }

    /// Source text of a token; `None` for branches
    pub fn text(&self) -> Option<&str> {
        match &self.data.content {
            Content::Token(text) => Some(text),
            Content::Branch(_) => None,
        }
    }

    /// Children of a branch; empty for tokens
    pub fn children(&self) -> &[Node<L>] {
        match &self.data.content {
            Content::Token(_) => &[],
            Content::Branch(children) => children,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node<L>> {
        self.children().get(index)
    }

    /// First child of the given kind
    pub fn child_of(&self, kind: L::Kind) -> Option<&Node<L>> {
        self.children().iter().find(|c| c.kind() == kind)
    }

    /// All children of the given kind
    pub fn children_of(&self, kind: L::Kind) -> impl Iterator<Item = &Node<L>> {
        self.children().iter().filter(move |c| c.kind() == kind)
    }

    /// Position of the child with the given id
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.children().iter().position(|c| c.id() == id)
    }

    /// Whether two handles point at the very same node value
    pub fn ptr_eq(a: &Node<L>, b: &Node<L>) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }

    pub fn with_formatting(&self, formatting: Formatting) -> Self {
        if self.data.formatting == formatting {
            return self.clone();
        }
        self.rebuild(|d| d.formatting = formatting)
    }

    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        let formatting = self.data.formatting.with_prefix(prefix);
        self.with_formatting(formatting)
    }

    /// Replace the text of a token, keeping its identity and formatting
    pub fn with_text(&self, text: impl Into<String>) -> Result<Self, StructureError> {
        let text = text.into();
        match &self.data.content {
            Content::Token(current) if *current == text => Ok(self.clone()),
            Content::Token(_) => Ok(self.rebuild(|d| d.content = Content::Token(text))),
            Content::Branch(_) => Err(StructureError::new(
                format!("{:?}", self.kind()),
                0,
                "token",
                "branch",
            )),
        }
    }

    /// Replace all children, keeping identity; the grammar is re-checked
    pub fn with_children(&self, children: Vec<Node<L>>) -> Result<Self, StructureError> {
        if self.is_token() {
            return Err(StructureError::new(
                format!("{:?}", self.kind()),
                0,
                "no children",
                format!("{} children", children.len()),
            ));
        }
        L::check(self.kind(), &children)?;
        Ok(self.rebuild(|d| d.content = Content::Branch(children)))
    }

    /// Replace the child at `index`
    pub fn with_child(&self, index: usize, child: Node<L>) -> Result<Self, StructureError> {
        let mut children = self.children().to_vec();
        if index >= children.len() {
            return Err(StructureError::new(
                format!("{:?}", self.kind()),
                index,
                format!("index below {}", children.len()),
                format!("{:?}", child.kind()),
            ));
        }
        children[index] = child;
        self.with_children(children)
    }

    pub fn with_type(&self, ty: Option<TypeId>) -> Self {
        if self.data.ty == ty {
            return self.clone();
        }
        self.rebuild(|d| d.ty = ty)
    }

    pub fn with_marker(&self, marker: Marker) -> Self {
        let markers = self.data.markers.with(marker);
        self.rebuild(|d| d.markers = markers)
    }

    /// Same content under a new identity
    pub fn renew(&self) -> Self {
        self.rebuild(|d| d.id = NodeId::fresh())
    }

    /// Pre-order iterator over this node and everything below it
    pub fn descendants(&self) -> Descendants<'_, L> {
        Descendants { stack: vec![self] }
    }

    /// Leaves of this subtree in source order
    pub fn tokens(&self) -> impl Iterator<Item = &Node<L>> {
        self.descendants().filter(|n| n.is_token())
    }

    /// First token of this subtree
    pub fn first_token(&self) -> Option<&Node<L>> {
        self.tokens().next()
    }

    /// Find a node in this subtree by id
    pub fn find(&self, id: NodeId) -> Option<&Node<L>> {
        self.descendants().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }
}

/// Pre-order traversal over a subtree
pub struct Descendants<'a, L: Language> {
    stack: Vec<&'a Node<L>>,
}

impl<'a, L: Language> Iterator for Descendants<'a, L> {
    type Item = &'a Node<L>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

impl<L: Language> fmt::Debug for Node<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data.content {
            Content::Token(text) => write!(f, "{:?}{} {:?}", self.kind(), self.id(), text),
            Content::Branch(children) => f
                .debug_struct(&format!("{:?}{}", self.kind(), self.id()))
                .field("children", children)
                .finish(),
        }
    }
}

impl<L: Language> fmt::Display for Node<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::printer::print(self))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A tiny grammar for exercising the generic machinery
    //!
    //! `List := '(' (Atom | List)* ')'`, atoms are single tokens.

    use super::*;
    use crate::grammar::Shape;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Kind {
        List,
        Open,
        Close,
        Atom,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Sexp;

    impl Language for Sexp {
        type Kind = Kind;

        fn check(kind: Kind, children: &[Node<Self>]) -> Result<(), StructureError> {
            match kind {
                Kind::List => Shape::of(kind, children)
                    .token(Kind::Open)?
                    .many(|k| matches!(k, Kind::Atom | Kind::List))
                    .token(Kind::Close)?
                    .end(),
                Kind::Open | Kind::Close | Kind::Atom => Shape::of(kind, children).end(),
            }
        }
    }

    /// Parse `(a (b c) d)` style text, whitespace attached as prefixes
    pub fn parse(text: &str) -> Node<Sexp> {
        let mut pos = 0;
        let node = parse_list(text, &mut pos);
        let rest = &text[pos..];
        node.with_formatting(node.formatting().with_suffix(rest))
    }

    fn take_ws(text: &str, pos: &mut usize) -> String {
        let start = *pos;
        while *pos < text.len() && text.as_bytes()[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        text[start..*pos].to_string()
    }

    fn parse_list(text: &str, pos: &mut usize) -> Node<Sexp> {
        let ws = take_ws(text, pos);
        assert_eq!(&text[*pos..*pos + 1], "(");
        *pos += 1;
        let mut children = vec![Node::token(Kind::Open, Formatting::new(ws), "(")];
        loop {
            let save = *pos;
            let ws = take_ws(text, pos);
            let c = &text[*pos..*pos + 1];
            if c == ")" {
                *pos += 1;
                children.push(Node::token(Kind::Close, Formatting::new(ws), ")"));
                break;
            } else if c == "(" {
                *pos = save;
                children.push(parse_list(text, pos));
            } else {
                let start = *pos;
                while *pos < text.len()
                    && !text.as_bytes()[*pos].is_ascii_whitespace()
                    && !matches!(text.as_bytes()[*pos], b'(' | b')')
                {
                    *pos += 1;
                }
                children.push(Node::token(Kind::Atom, Formatting::new(ws), &text[start..*pos]));
            }
        }
        Node::enclose(Kind::List, children).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Kind, Sexp, parse};
    use super::*;

    #[test]
    fn test_enclose_lifts_prefix() {
        let tree = parse("  (a b)");
        assert_eq!(tree.prefix(), "  ");
        assert_eq!(tree.children()[0].prefix(), "");
        assert_eq!(tree.to_string(), "  (a b)");
    }

    #[test]
    fn test_with_text_keeps_identity() {
        let tree = parse("(a b)");
        let atom = &tree.children()[1];
        let renamed = atom.with_text("z").unwrap();
        assert_eq!(renamed.id(), atom.id());
        assert_eq!(renamed.text(), Some("z"));
        assert_eq!(atom.text(), Some("a"));
    }

    #[test]
    fn test_with_children_validates() {
        let tree = parse("(a)");
        let bad = vec![Node::<Sexp>::token(Kind::Atom, Formatting::EMPTY, "x")];
        let err = tree.with_children(bad).unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.node, "List");
    }

    #[test]
    fn test_untouched_children_are_shared() {
        let tree = parse("(a (b c) d)");
        let atom = tree.children()[1].with_text("x").unwrap();
        let edited = tree.with_child(1, atom).unwrap();
        assert!(Node::ptr_eq(&edited.children()[2], &tree.children()[2]));
        assert_eq!(edited.to_string(), "(x (b c) d)");
        assert_eq!(tree.to_string(), "(a (b c) d)");
    }

    #[test]
    fn test_descendants_pre_order() {
        let tree = parse("(a (b) c)");
        let atoms: Vec<_> = tree
            .descendants()
            .filter(|n| n.kind() == Kind::Atom)
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(atoms, vec!["a", "b", "c"]);
        let inner = &tree.children()[2];
        assert!(tree.find(inner.id()).is_some());
    }
}
