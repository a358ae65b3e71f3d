//! Read-only queries over Java trees

use remold_core::types::package_of;
use remold_core::{Node, NodeId, Result, find_references, locate, mark_references};

use crate::scope::JavaScopeRules;
use crate::syntax::{Java, JavaKind};
use crate::view::{AstNode, CompilationUnit};

/// The declared variable that `id` names: a `NamedVar` or its name token
pub(crate) fn variable_declaration(root: &Node<Java>, id: NodeId) -> Option<NodeId> {
    let cursor = locate(root, id)?;
    match cursor.node().kind() {
        JavaKind::NamedVar => Some(id),
        JavaKind::Ident => cursor
            .parent_node()
            .filter(|p| p.kind() == JavaKind::NamedVar && cursor.index_in_parent() == Some(0))
            .map(Node::id),
        _ => None,
    }
}

/// Uses of the variable declared by `decl`, in source order
///
/// `decl` is the declared variable or its name. Shadowed and unrelated
/// variables of the same name are not included, nor is the declaration.
pub fn find_references_to_variable(root: &Node<Java>, decl: NodeId) -> Result<Vec<NodeId>> {
    match variable_declaration(root, decl) {
        Some(decl) => find_references(&JavaScopeRules, root, decl),
        None => Ok(Vec::new()),
    }
}

/// Mark every use of the variable declared by `decl` as a search result
pub fn mark_references_to_variable(root: &Node<Java>, decl: NodeId) -> Result<Node<Java>> {
    match variable_declaration(root, decl) {
        Some(decl) => mark_references(&JavaScopeRules, root, decl),
        None => Ok(root.clone()),
    }
}

/// Whether the unit imports the class `fqn`, directly or on demand
///
/// An on-demand import of a package covers its classes and their nested
/// classes; importing a class covers the classes nested in it.
pub fn has_import(unit: &Node<Java>, fqn: &str) -> bool {
    let Some(unit) = CompilationUnit::cast(unit) else {
        return false;
    };
    unit.imports().filter(|i| !i.is_static()).any(|import| {
        let name = import.name();
        match name.strip_suffix(".*") {
            Some(owner) => {
                package_of(fqn) == owner || fqn.rsplit_once('.').is_some_and(|(outer, _)| outer == owner)
            }
            None => name == fqn || fqn.starts_with(&format!("{name}.")),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JavaParser;
    use remold_core::TypeCache;
    use std::sync::Arc;

    fn unit(text: &str) -> Node<Java> {
        JavaParser::new(Arc::new(TypeCache::new()))
            .parse(&[text])
            .unwrap()
            .remove(0)
            .root
    }

    #[test]
    fn test_single_type_import() {
        let a = unit("import java.util.List;\nclass A {}");
        assert!(has_import(&a, "java.util.List"));
        assert!(!has_import(&a, "java.util.Set"));
        assert!(!has_import(&a, "java.util.Lists"));
    }

    #[test]
    fn test_on_demand_import_of_nested_class() {
        let c = unit("import a.A.*;\nclass C {}");
        assert!(has_import(&c, "a.A.B"));
        assert!(!has_import(&c, "a.A.B.D"));
    }

    #[test]
    fn test_static_imports_do_not_count() {
        let c = unit("import static a.A.b;\nclass C {}");
        assert!(!has_import(&c, "a.A.b"));
    }

    #[test]
    fn test_declaration_from_name() {
        let a = unit("class A { int n; }");
        let var = a.descendants().find(|n| n.kind() == JavaKind::NamedVar).unwrap();
        let name = &var.children()[0];
        assert_eq!(variable_declaration(&a, name.id()), Some(var.id()));
        assert_eq!(variable_declaration(&a, var.id()), Some(var.id()));
        assert_eq!(variable_declaration(&a, a.id()), None);
    }
}
