//! Typed views over Java trees
//!
//! Each view wraps a borrowed node of one kind and exposes the parts
//! refactorings ask for by name rather than by child position.
//!
//! ```ignore
//! let unit = CompilationUnit::cast(&source.root).unwrap();
//! for class in unit.classes() {
//!     println!("{}", class.name());
//! }
//! ```

use remold_core::{Node, TypeId};

use crate::syntax::{Java, JavaKind};

/// Casting between raw nodes and typed views
pub trait AstNode<'a>: Sized {
    fn can_cast(kind: JavaKind) -> bool;
    fn cast(node: &'a Node<Java>) -> Option<Self>;
    fn syntax(&self) -> &'a Node<Java>;
}

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            syntax: &'a Node<Java>,
        }

        impl<'a> AstNode<'a> for $name<'a> {
            fn can_cast(kind: JavaKind) -> bool {
                kind == JavaKind::$kind
            }

            fn cast(node: &'a Node<Java>) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &'a Node<Java> {
                self.syntax
            }
        }
    };
}

ast_node!(CompilationUnit, CompilationUnit);
ast_node!(Import, Import);
ast_node!(ClassDecl, ClassDecl);
ast_node!(MethodDecl, MethodDecl);
ast_node!(VariableDecls, VariableDecls);
ast_node!(Block, Block);

/// Dotted text of a name: `a.b.C` for a field access chain, `C` for an identifier
pub fn name_text(node: &Node<Java>) -> Option<String> {
    match node.kind() {
        JavaKind::Ident => node.text().map(str::to_string),
        JavaKind::FieldAccess => {
            let target = name_text(node.child(0)?)?;
            let name = node.child(2)?.text()?;
            Some(format!("{target}.{name}"))
        }
        JavaKind::ParameterizedType => name_text(node.child(0)?),
        _ => None,
    }
}

/// Last segment of a dotted name
pub fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

impl<'a> CompilationUnit<'a> {
    /// Declared package, empty for the default package
    pub fn package_name(&self) -> String {
        self.syntax
            .child_of(JavaKind::Package)
            .and_then(|p| p.child(1))
            .and_then(name_text)
            .unwrap_or_default()
    }

    pub fn imports(&self) -> impl Iterator<Item = Import<'a>> + use<'a> {
        self.syntax.children().iter().filter_map(Import::cast)
    }

    /// Top-level type declarations
    pub fn classes(&self) -> impl Iterator<Item = ClassDecl<'a>> + use<'a> {
        self.syntax.children().iter().filter_map(ClassDecl::cast)
    }
}

impl Import<'_> {
    /// Imported name, ending in `*` for an on-demand import
    pub fn name(&self) -> String {
        self.syntax
            .children()
            .iter()
            .find(|c| c.kind().is_name())
            .and_then(name_text)
            .unwrap_or_default()
    }

    pub fn is_static(&self) -> bool {
        self.syntax.child(1).and_then(Node::text) == Some("static")
    }

    pub fn is_star(&self) -> bool {
        self.name().ends_with(".*")
    }
}

impl<'a> ClassDecl<'a> {
    pub fn name(&self) -> &'a str {
        self.syntax
            .child_of(JavaKind::Ident)
            .and_then(Node::text)
            .unwrap_or_default()
    }

    pub fn is_interface(&self) -> bool {
        self.syntax
            .children_of(JavaKind::Keyword)
            .any(|k| k.text() == Some("interface"))
    }

    pub fn body(&self) -> Option<&'a Node<Java>> {
        self.syntax.child_of(JavaKind::ClassBody)
    }

    pub fn extends(&self) -> Option<&'a Node<Java>> {
        self.syntax.child_of(JavaKind::Extends)
    }

    pub fn implements(&self) -> Option<&'a Node<Java>> {
        self.syntax.child_of(JavaKind::Implements)
    }

    /// Type names listed after `extends` and `implements`
    pub fn supertypes(&self) -> impl Iterator<Item = &'a Node<Java>> + use<'a> {
        self.extends()
            .into_iter()
            .chain(self.implements())
            .flat_map(|clause| clause.children().iter().skip(1))
            .filter(|c| c.kind() != JavaKind::Comma)
    }

    pub fn members(&self) -> impl Iterator<Item = &'a Node<Java>> + use<'a> {
        self.body()
            .into_iter()
            .flat_map(|b| b.children().iter())
            .filter(|c| c.kind().is_member())
    }

    pub fn fields(&self) -> impl Iterator<Item = VariableDecls<'a>> + use<'a> {
        self.members().filter_map(VariableDecls::cast)
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodDecl<'a>> + use<'a> {
        self.members().filter_map(MethodDecl::cast)
    }

    pub fn nested(&self) -> impl Iterator<Item = ClassDecl<'a>> + use<'a> {
        self.members().filter_map(ClassDecl::cast)
    }

    pub fn ty(&self) -> Option<TypeId> {
        self.syntax.ty()
    }
}

impl<'a> MethodDecl<'a> {
    pub fn name(&self) -> &'a str {
        self.name_node().and_then(Node::text).unwrap_or_default()
    }

    fn name_node(&self) -> Option<&'a Node<Java>> {
        let children = self.syntax.children();
        let params = self.syntax.index_of(self.syntax.child_of(JavaKind::Params)?.id())?;
        children.get(params.checked_sub(1)?)
    }

    /// `None` for constructors
    pub fn return_type(&self) -> Option<&'a Node<Java>> {
        let children = self.syntax.children();
        let lead = children
            .iter()
            .take_while(|c| matches!(c.kind(), JavaKind::Modifiers | JavaKind::TypeParams))
            .count();
        let candidate = children.get(lead)?;
        let name = self.name_node()?;
        (candidate.id() != name.id()).then_some(candidate)
    }

    pub fn is_constructor(&self) -> bool {
        self.return_type().is_none()
    }

    pub fn params(&self) -> impl Iterator<Item = VariableDecls<'a>> + use<'a> {
        self.syntax
            .child_of(JavaKind::Params)
            .into_iter()
            .flat_map(|p| p.children().iter())
            .filter_map(VariableDecls::cast)
    }

    pub fn body(&self) -> Option<Block<'a>> {
        self.syntax.child_of(JavaKind::Block).and_then(Block::cast)
    }
}

impl<'a> VariableDecls<'a> {
    pub fn type_expr(&self) -> Option<&'a Node<Java>> {
        self.syntax
            .children()
            .iter()
            .find(|c| c.kind() != JavaKind::Modifiers)
    }

    /// The declared `NamedVar` nodes
    pub fn vars(&self) -> impl Iterator<Item = &'a Node<Java>> + use<'a> {
        self.syntax.children_of(JavaKind::NamedVar)
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.vars().filter_map(var_name)
    }
}

/// Declared name of a `NamedVar`
pub fn var_name(var: &Node<Java>) -> Option<&str> {
    var.child(0).and_then(Node::text)
}

impl<'a> Block<'a> {
    pub fn statements(&self) -> impl Iterator<Item = &'a Node<Java>> + use<'a> {
        self.syntax
            .children()
            .iter()
            .filter(|c| c.kind().is_statement())
    }

    /// The same block holding `statements` between its braces
    pub fn with_statements(&self, statements: Vec<Node<Java>>) -> remold_core::Result<Node<Java>> {
        let children = self.syntax.children();
        let open = children
            .iter()
            .position(|c| c.kind() == JavaKind::LBrace)
            .unwrap_or_default();
        let mut rebuilt: Vec<Node<Java>> = children[..=open].to_vec();
        rebuilt.extend(statements);
        rebuilt.extend(children.last().cloned());
        Ok(self.syntax.with_children(rebuilt)?)
    }
}
