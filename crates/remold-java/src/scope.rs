//! Scoping rules for reference resolution
//!
//! Compilation units, class bodies, methods and blocks open scopes. Fields are
//! visible throughout their class body; locals and parameters from their
//! declaration on. A qualified use such as `this.n` or `b.n`, and a bare use
//! of an inherited field, is matched by the variable descriptor attribution
//! put on its name.

use remold_core::{Cursor, Node, Reference, ScopeRules};

use crate::syntax::{Java, JavaKind};

pub(crate) fn opens_scope(kind: JavaKind) -> bool {
    matches!(
        kind,
        JavaKind::CompilationUnit | JavaKind::ClassBody | JavaKind::MethodDecl | JavaKind::Block
    )
}

/// Whether the identifier under `cursor` reads or writes a variable
///
/// `a` counts in `a = 1`, `f(a)` and `a.b.c()`; it does not count as a type
/// name, a method name or the name selected by a field access.
pub(crate) fn is_variable_use(cursor: &Cursor<Java>) -> bool {
    if cursor.node().kind() != JavaKind::Ident {
        return false;
    }
    let mut current = cursor.clone();
    loop {
        let (Some(parent), Some(index)) = (current.parent(), current.index_in_parent()) else {
            return false;
        };
        match parent.node().kind() {
            JavaKind::FieldAccess if index == 0 => current = parent,
            JavaKind::MethodInvocation => {
                return index == 0 && current.node().kind() == JavaKind::FieldAccess;
            }
            JavaKind::NamedVar => return index > 0,
            JavaKind::ExprStatement
            | JavaKind::Assign
            | JavaKind::AssignOp
            | JavaKind::Binary
            | JavaKind::Prefix
            | JavaKind::Postfix
            | JavaKind::Parens
            | JavaKind::Args
            | JavaKind::Return
            | JavaKind::ArrayAccess => return true,
            _ => return false,
        }
    }
}

/// Scope rules of Java trees
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScopeRules;

impl ScopeRules<Java> for JavaScopeRules {
    fn opens_scope(&self, kind: JavaKind) -> bool {
        opens_scope(kind)
    }

    fn hoisted<'n>(&self, scope: &'n Node<Java>) -> Vec<&'n Node<Java>> {
        if scope.kind() != JavaKind::ClassBody {
            return Vec::new();
        }
        scope
            .children_of(JavaKind::VariableDecls)
            .flat_map(|decls| decls.children_of(JavaKind::NamedVar))
            .collect()
    }

    fn name_of<'n>(&self, node: &'n Node<Java>) -> Option<&'n Node<Java>> {
        if node.kind() == JavaKind::NamedVar {
            node.child(0)
        } else {
            None
        }
    }

    fn reference(&self, node: &Node<Java>, cursor: &Cursor<Java>) -> Option<Reference> {
        if node.kind() != JavaKind::Ident {
            return None;
        }
        if is_variable_use(cursor) {
            let name = node.text()?;
            // inherited fields are declared in no enclosing scope
            if cursor.resolve(name).is_none() {
                return node.ty().map(Reference::Attributed);
            }
            return Some(Reference::Lexical(name.to_string()));
        }
        let selected = cursor
            .parent_node()
            .is_some_and(|p| p.kind() == JavaKind::FieldAccess)
            && cursor.index_in_parent() == Some(2);
        if selected {
            node.ty().map(Reference::Attributed)
        } else {
            None
        }
    }
}
