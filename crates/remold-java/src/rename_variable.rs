//! Rename one variable and the uses that resolve to it

use remold_core::{
    Node, NodeId, RefactorContext, RefactorVisitor, Result, SourceFile, Validated, rename,
};
use tracing::debug;

use crate::scope::JavaScopeRules;
use crate::search::variable_declaration;
use crate::syntax::Java;

/// Rename the variable declared by `decl`
///
/// `decl` is the declared variable or its name token. Variables of the same
/// name that shadow it, or that it shadows, keep their names. Units that do
/// not contain the declaration are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameVariable {
    pub decl: NodeId,
    pub to: String,
}

impl RenameVariable {
    pub const TYPE: &'static str = "java.RenameVariable";

    pub fn new(decl: NodeId, to: impl Into<String>) -> Self {
        Self {
            decl,
            to: to.into(),
        }
    }

    pub fn apply(&self, root: &Node<Java>) -> Result<Node<Java>> {
        let Some(decl) = variable_declaration(root, self.decl) else {
            return Ok(root.clone());
        };
        debug!("Renaming variable {} to '{}'", decl, self.to);
        rename(&JavaScopeRules, root, decl, &self.to)
    }
}

impl RefactorVisitor<Java> for RenameVariable {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn validate(&self) -> Validated {
        Validated::not_blank("to", Some(self.to.as_str()))
    }

    fn refactor(&self, source: &SourceFile<Java>, _ctx: &mut RefactorContext<Java>) -> Result<Node<Java>> {
        self.apply(&source.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JavaKind, JavaParser};
    use remold_core::{TypeCache, print};
    use std::sync::Arc;

    #[test]
    fn test_unknown_declaration_is_a_no_op() {
        let unit = JavaParser::new(Arc::new(TypeCache::new()))
            .parse(&["class A { int n; }"])
            .unwrap()
            .remove(0);
        let renamed = RenameVariable::new(NodeId::fresh(), "m").apply(&unit.root).unwrap();
        assert!(Node::ptr_eq(&renamed, &unit.root));
    }

    #[test]
    fn test_field_uses_renamed() {
        let unit = JavaParser::new(Arc::new(TypeCache::new()))
            .parse(&["class A { int n; void f() { n = n + 1; } }"])
            .unwrap()
            .remove(0);
        let field = unit
            .root
            .descendants()
            .find(|n| n.kind() == JavaKind::NamedVar)
            .unwrap();
        let renamed = RenameVariable::new(field.id(), "count").apply(&unit.root).unwrap();
        assert_eq!(print(&renamed), "class A { int count; void f() { count = count + 1; } }");
    }
}
