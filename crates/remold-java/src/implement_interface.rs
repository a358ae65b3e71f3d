//! Make a class implement an interface

use std::sync::Arc;

use remold_core::{
    Formatting, Node, NodeId, RefactorContext, RefactorVisitor, Result, SourceFile, Type,
    TypeCache, Validated, locate,
};
use tracing::debug;

use crate::add_import::AddImport;
use crate::syntax::{Java, JavaKind};
use crate::view::{AstNode, ClassDecl, name_text, simple_name};

/// Add `interface` to the `implements` clause of the class declared by `class`
///
/// The interface is named by its simple name and imported. The class
/// descriptor attached to the declaration is replaced by one that lists the
/// interface.
#[derive(Debug, Clone)]
pub struct ImplementInterface {
    cache: Arc<TypeCache>,
    pub class: NodeId,
    pub interface: String,
}

impl ImplementInterface {
    pub const TYPE: &'static str = "java.ImplementInterface";

    pub fn new(cache: Arc<TypeCache>, class: NodeId, interface: impl Into<String>) -> Self {
        Self {
            cache,
            class,
            interface: interface.into(),
        }
    }

    /// The rewritten unit, or `None` when the class is absent or already
    /// implements the interface
    pub fn apply(&self, root: &Node<Java>) -> Result<Option<Node<Java>>> {
        let Some(cursor) = locate(root, self.class) else {
            return Ok(None);
        };
        let Some(class) = ClassDecl::cast(cursor.node()) else {
            return Ok(None);
        };
        let simple = simple_name(&self.interface);
        let already = class
            .implements()
            .into_iter()
            .flat_map(|clause| clause.children().iter().skip(1))
            .filter_map(name_text)
            .any(|name| name == simple || name == self.interface);
        if already {
            return Ok(None);
        }

        let interface_ty = self.cache.build_class(&self.interface);
        let name = Node::token(JavaKind::Ident, Formatting::new(" "), simple)
            .with_type(Some(interface_ty));
        let decl = cursor.node();
        let mut children = decl.children().to_vec();
        match class.implements().and_then(|clause| decl.index_of(clause.id())) {
            Some(index) => {
                let clause = &children[index];
                let mut listed = clause.children().to_vec();
                listed.insert(1, Node::token(JavaKind::Comma, Formatting::EMPTY, ","));
                listed.insert(1, name);
                children[index] = clause.with_children(listed)?;
            }
            None => {
                let body = children
                    .iter()
                    .position(|c| c.kind() == JavaKind::ClassBody)
                    .unwrap_or(children.len());
                let clause = Node::branch(
                    JavaKind::Implements,
                    Formatting::new(" "),
                    vec![Node::token(JavaKind::Keyword, Formatting::EMPTY, "implements"), name],
                )?;
                children.insert(body, clause);
            }
        }

        let ty = decl
            .ty()
            .and_then(|id| self.cache.class(id))
            .map(|class| self.cache.intern(Type::Class(class.with_interface(interface_ty))));
        let updated = decl.with_children(children)?.with_type(ty.or(decl.ty()));
        debug!("Class {} now implements {}", class.name(), self.interface);
        Ok(Some(cursor.replace(updated)?))
    }
}

impl RefactorVisitor<Java> for ImplementInterface {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn validate(&self) -> Validated {
        Validated::not_blank("interface", Some(self.interface.as_str()))
    }

    fn refactor(&self, source: &SourceFile<Java>, ctx: &mut RefactorContext<Java>) -> Result<Node<Java>> {
        match self.apply(&source.root)? {
            Some(updated) => {
                ctx.and_then(AddImport::new(self.interface.clone()));
                Ok(updated)
            }
            None => Ok(source.root.clone()),
        }
    }
}
