//! Rename a field of a class everywhere it is used

use std::collections::HashSet;
use std::sync::Arc;

use remold_core::resolver::rename_tokens;
use remold_core::{
    Node, NodeId, RefactorContext, RefactorVisitor, Result, ScopeRules, SourceFile, Type,
    TypeCache, TypeId, Validated, VisitorConfig,
};
use tracing::debug;

use crate::scope::JavaScopeRules;
use crate::syntax::{Java, JavaKind};
use crate::view::{AstNode, ClassDecl, var_name};

/// Rename field `from` of class `class` to `to`
///
/// The declaration is renamed in the unit that declares the class. Uses are
/// renamed in every unit when attribution typed their name as that field:
/// qualified accesses such as `this.n` or `b.n`, bare uses in the class and
/// bare uses in subclasses that inherit the field.
#[derive(Debug, Clone)]
pub struct ChangeFieldName {
    cache: Arc<TypeCache>,
    pub class: String,
    pub from: String,
    pub to: String,
}

impl ChangeFieldName {
    pub const TYPE: &'static str = "java.ChangeFieldName";

    pub fn new(
        cache: Arc<TypeCache>,
        class: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            class: class.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from_config(config: &VisitorConfig, cache: Arc<TypeCache>) -> Result<Self> {
        let visitor = Self::new(
            cache,
            config.string("type").unwrap_or_default(),
            config.string("hasName").unwrap_or_default(),
            config.string("toName").unwrap_or_default(),
        );
        visitor.validate().into_result()?;
        Ok(visitor)
    }

    pub fn validate(&self) -> Validated {
        Validated::not_blank("type", Some(self.class.as_str()))
            .and(Validated::not_blank("hasName", Some(self.from.as_str())))
            .and(Validated::not_blank("toName", Some(self.to.as_str())))
    }

    fn is_target_class(&self, ty: Option<TypeId>) -> bool {
        ty.and_then(|t| self.cache.fqn(t))
            .is_some_and(|fqn| fqn == self.class)
    }

    /// Whether `ty` describes the field being renamed
    fn is_target_field(&self, ty: TypeId) -> bool {
        match self.cache.get(ty).as_deref() {
            Some(Type::Variable {
                name,
                owner: Some(owner),
                ..
            }) => *name == self.from && self.is_target_class(Some(*owner)),
            _ => false,
        }
    }

    pub fn apply(&self, root: &Node<Java>) -> Result<Node<Java>> {
        let mut targets: HashSet<NodeId> = HashSet::new();

        let declarations = root
            .descendants()
            .filter(|n| n.kind() == JavaKind::ClassDecl && self.is_target_class(n.ty()))
            .filter_map(ClassDecl::cast)
            .flat_map(|class| class.fields().flat_map(|f| f.vars()))
            .filter(|var| var_name(var) == Some(self.from.as_str()));
        targets.extend(declarations.filter_map(|var| JavaScopeRules.name_of(var)).map(Node::id));

        targets.extend(
            root.descendants()
                .filter(|n| n.kind() == JavaKind::Ident)
                .filter(|n| n.ty().is_some_and(|ty| self.is_target_field(ty)))
                .map(Node::id),
        );

        if targets.is_empty() {
            return Ok(root.clone());
        }
        debug!(
            "Renaming {} occurrences of {}.{} to '{}'",
            targets.len(),
            self.class,
            self.from,
            self.to
        );
        rename_tokens(root, &targets, &self.to)
    }
}

impl RefactorVisitor<Java> for ChangeFieldName {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn validate(&self) -> Validated {
        ChangeFieldName::validate(self)
    }

    fn refactor(&self, source: &SourceFile<Java>, _ctx: &mut RefactorContext<Java>) -> Result<Node<Java>> {
        self.apply(&source.root)
    }
}
