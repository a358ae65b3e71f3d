//! Remold Java
//!
//! A lossless front-end for a Java-like language: classes and interfaces,
//! fields, methods and constructors, statements and expressions. Units are
//! parsed in batches and attributed together, so declarations in one unit
//! give types to uses in another.
//!
//! On top of the typed tree sit the variable reference queries, a builder for
//! attributed snippets and the refactorings: renaming variables and fields,
//! adding imports and implementing interfaces.

mod add_import;
mod attribute;
mod builder;
mod change_field_name;
mod implement_interface;
mod lexer;
mod parser;
mod rename_variable;
mod scope;
mod search;
mod syntax;
mod view;

use std::sync::Arc;

pub use add_import::AddImport;
pub use builder::TreeBuilder;
pub use change_field_name::ChangeFieldName;
pub use implement_interface::ImplementInterface;
pub use parser::JavaParser;
pub use rename_variable::RenameVariable;
pub use scope::JavaScopeRules;
pub use search::{find_references_to_variable, has_import, mark_references_to_variable};
pub use syntax::{Java, JavaKind};
pub use view::{
    AstNode, Block, ClassDecl, CompilationUnit, Import, MethodDecl, VariableDecls, name_text,
    simple_name, var_name,
};

use remold_core::{RefactorVisitor, RemoldError, Result, TypeCache, VisitorConfig};

/// A node of a Java tree
pub type JavaNode = remold_core::Node<Java>;

/// Build the Java visitor a recipe entry names
///
/// Visitors that address declarations by node id cannot be configured and
/// are constructed directly.
pub fn visitor_from_config(
    config: &VisitorConfig,
    cache: Arc<TypeCache>,
) -> Result<Box<dyn RefactorVisitor<Java>>> {
    match config.kind.as_str() {
        ChangeFieldName::TYPE => Ok(Box::new(ChangeFieldName::from_config(config, cache)?)),
        AddImport::TYPE => Ok(Box::new(AddImport::from_config(config)?)),
        other => Err(RemoldError::config_error(format!(
            "unknown Java visitor '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remold_core::ErrorKind;

    #[test]
    fn test_visitor_from_config() {
        let cache = Arc::new(TypeCache::new());
        let config = VisitorConfig::new(AddImport::TYPE).with_option("type", "java.util.List");
        let visitor = visitor_from_config(&config, Arc::clone(&cache)).unwrap();
        assert_eq!(visitor.name(), AddImport::TYPE);

        let err = visitor_from_config(&VisitorConfig::new("java.Unknown"), cache)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
