//! Scope-aware reference resolution
//!
//! Resolution walks a tree with a [`Cursor`], declaring names in the scope
//! that owns them as declarations are entered. A use site is resolved
//! innermost-first through the cursor's scope chain, so an inner declaration
//! shadows an outer one of the same name. A use only counts as a reference
//! when resolution ends at the exact target declaration.
//!
//! Qualified uses (a member selected from an expression) cannot be resolved
//! lexically. For those the language reports the attributed type of the use,
//! which matches when it is the same flyweight as the declaration's type.
//!
//! Unresolved names are not an error; they simply produce no matches.

use std::collections::HashSet;

use crate::cursor::{Binding, Cursor};
use crate::marker::Marker;
use crate::result::Result;
use crate::tree::{Language, Node, NodeId};
use crate::types::TypeId;
use crate::visitor::{Visitor, visit};

/// How a use site names its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A bare name, resolved through the lexical scope chain
    Lexical(String),
    /// A qualified member whose variable type was attributed by the front-end
    Attributed(TypeId),
}

/// Per-language rules for scopes, declarations and uses
pub trait ScopeRules<L: Language> {
    /// Whether a node of this kind introduces a lexical scope
    fn opens_scope(&self, kind: L::Kind) -> bool;

    /// Declarations visible throughout `scope`, wherever they appear in it
    fn hoisted<'n>(&self, _scope: &'n Node<L>) -> Vec<&'n Node<L>> {
        Vec::new()
    }

    /// The name token of `node` when `node` is a declaration
    fn name_of<'n>(&self, node: &'n Node<L>) -> Option<&'n Node<L>>;

    /// How `node` refers to a declaration, if it is a use site
    fn reference(&self, node: &Node<L>, cursor: &Cursor<L>) -> Option<Reference>;
}

struct Resolution<'r, L: Language, R: ScopeRules<L> + ?Sized> {
    rules: &'r R,
    target: NodeId,
    target_ty: Option<TypeId>,
    matches: Vec<NodeId>,
    _language: std::marker::PhantomData<L>,
}

impl<L: Language, R: ScopeRules<L> + ?Sized> Resolution<'_, L, R> {
    fn bind(&self, scope: &Cursor<L>, decl: &Node<L>) {
        if let Some(name) = self.rules.name_of(decl).and_then(Node::text) {
            scope.declare(
                name,
                Binding {
                    decl: decl.id(),
                    ty: decl.ty(),
                },
            );
        }
    }
}

impl<L: Language, R: ScopeRules<L> + ?Sized> Visitor<L> for Resolution<'_, L, R> {
    fn enter(&mut self, cursor: &Cursor<L>) -> Result<()> {
        let node = cursor.node();
        if self.rules.opens_scope(node.kind()) {
            for decl in self.rules.hoisted(node) {
                self.bind(cursor, decl);
            }
        }
        if self.rules.name_of(node).is_some()
            && let Some(scope) = cursor.enclosing(|k| self.rules.opens_scope(k))
        {
            self.bind(&scope, node);
        }
        let matched = match self.rules.reference(node, cursor) {
            Some(Reference::Lexical(name)) => cursor
                .resolve(&name)
                .is_some_and(|binding| binding.decl == self.target),
            Some(Reference::Attributed(ty)) => self.target_ty == Some(ty),
            None => false,
        };
        if matched {
            self.matches.push(node.id());
        }
        Ok(())
    }
}

/// Ids of the use sites in `root` that refer to the declaration `decl`
///
/// Returns an empty list when `decl` is not part of `root`.
pub fn find_references<L, R>(rules: &R, root: &Node<L>, decl: NodeId) -> Result<Vec<NodeId>>
where
    L: Language,
    R: ScopeRules<L> + ?Sized,
{
    let Some(declaration) = root.find(decl) else {
        return Ok(Vec::new());
    };
    let mut resolution = Resolution {
        rules,
        target: decl,
        target_ty: declaration.ty(),
        matches: Vec::new(),
        _language: std::marker::PhantomData,
    };
    visit(&mut resolution, root)?;
    Ok(resolution.matches)
}

/// Rename a declaration and every use that resolves to it
///
/// Same-named declarations and uses in unrelated scopes are left alone.
pub fn rename<L, R>(rules: &R, root: &Node<L>, decl: NodeId, to: &str) -> Result<Node<L>>
where
    L: Language,
    R: ScopeRules<L> + ?Sized,
{
    let Some(declaration) = root.find(decl) else {
        return Ok(root.clone());
    };
    let mut targets: HashSet<NodeId> = find_references(rules, root, decl)?.into_iter().collect();
    if let Some(name) = rules.name_of(declaration) {
        targets.insert(name.id());
    }
    rename_tokens(root, &targets, to)
}

/// Rewrite the text of the given tokens
pub fn rename_tokens<L: Language>(root: &Node<L>, targets: &HashSet<NodeId>, to: &str) -> Result<Node<L>> {
    struct RenameTokens<'a> {
        targets: &'a HashSet<NodeId>,
        to: &'a str,
    }

    impl<L: Language> Visitor<L> for RenameTokens<'_> {
        fn visit(&mut self, node: Node<L>, _cursor: &Cursor<L>) -> Result<Node<L>> {
            if node.is_token() && self.targets.contains(&node.id()) {
                Ok(node.with_text(self.to)?)
            } else {
                Ok(node)
            }
        }
    }

    visit(&mut RenameTokens { targets, to }, root)
}

/// Attach a search-result marker to every reference of `decl`
pub fn mark_references<L, R>(rules: &R, root: &Node<L>, decl: NodeId) -> Result<Node<L>>
where
    L: Language,
    R: ScopeRules<L> + ?Sized,
{
    struct MarkMatches(HashSet<NodeId>);

    impl<L: Language> Visitor<L> for MarkMatches {
        fn visit(&mut self, node: Node<L>, _cursor: &Cursor<L>) -> Result<Node<L>> {
            if self.0.contains(&node.id()) {
                Ok(node.with_marker(Marker::search_result()))
            } else {
                Ok(node)
            }
        }
    }

    let matches = find_references(rules, root, decl)?;
    visit(&mut MarkMatches(matches.into_iter().collect()), root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testing::{Kind, Sexp, parse};

    /// `(let x)` declares `x` in the enclosing list; any other atom is a use
    struct LetRules;

    impl ScopeRules<Sexp> for LetRules {
        fn opens_scope(&self, kind: Kind) -> bool {
            kind == Kind::List
        }

        fn name_of<'n>(&self, node: &'n Node<Sexp>) -> Option<&'n Node<Sexp>> {
            if node.kind() == Kind::List && node.child(1)?.text() == Some("let") {
                node.child(2)
            } else {
                None
            }
        }

        fn reference(&self, node: &Node<Sexp>, cursor: &Cursor<Sexp>) -> Option<Reference> {
            if node.kind() != Kind::Atom || node.text() == Some("let") {
                return None;
            }
            let parent = cursor.parent_node()?;
            if self.name_of(parent).is_some_and(|name| name.id() == node.id()) {
                return None;
            }
            Some(Reference::Lexical(node.text()?.to_string()))
        }
    }

    fn outer_let(tree: &Node<Sexp>) -> NodeId {
        tree.children()[1].id()
    }

    #[test]
    fn test_shadowed_uses_are_skipped() {
        let tree = parse("((let n) n (n (let n) n) n)");
        let refs = find_references(&LetRules, &tree, outer_let(&tree)).unwrap();
        assert_eq!(refs.len(), 3);
    }

    #[test]
    fn test_rename_respects_shadowing() {
        let tree = parse("((let n) n (n (let n) n) n)");
        let out = rename(&LetRules, &tree, outer_let(&tree), "m").unwrap();
        assert_eq!(out.to_string(), "((let m) m (m (let n) n) m)");
    }

    #[test]
    fn test_unresolved_is_empty() {
        let tree = parse("((let n) x)");
        let refs = find_references(&LetRules, &tree, NodeId::fresh()).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_mark_references() {
        let tree = parse("((let n) n z)");
        let out = mark_references(&LetRules, &tree, outer_let(&tree)).unwrap();
        let marked: Vec<_> = out
            .descendants()
            .filter(|n| n.markers().is_search_result())
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(marked, vec!["n"]);
        assert_eq!(out.to_string(), "((let n) n z)");
    }
}
