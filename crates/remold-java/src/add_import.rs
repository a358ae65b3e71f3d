//! Add a single-type import to a compilation unit

use remold_core::types::package_of;
use remold_core::{
    Formatting, Node, RefactorContext, RefactorVisitor, Result, SourceFile, Validated,
    VisitorConfig,
};
use tracing::debug;

use crate::builder::dotted_name;
use crate::search::has_import;
use crate::syntax::{Java, JavaKind};
use crate::view::{AstNode, CompilationUnit, Import};

/// Import the class `fqn` unless it is already visible
///
/// Classes in `java.lang`, in the unit's own package or in the default
/// package are never imported. The new import is placed in sorted position
/// among the existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddImport {
    pub fqn: String,
}

impl AddImport {
    pub const TYPE: &'static str = "java.AddImport";

    pub fn new(fqn: impl Into<String>) -> Self {
        Self { fqn: fqn.into() }
    }

    pub fn from_config(config: &VisitorConfig) -> Result<Self> {
        config.required("type").into_result()?;
        Ok(Self::new(config.string("type").unwrap_or_default()))
    }

    fn is_needed(&self, unit: &Node<Java>) -> bool {
        let Some(view) = CompilationUnit::cast(unit) else {
            return false;
        };
        let package = package_of(&self.fqn);
        !(package.is_empty()
            || package == "java.lang"
            || package == view.package_name()
            || has_import(unit, &self.fqn))
    }

    pub fn apply(&self, unit: &Node<Java>) -> Result<Node<Java>> {
        if !self.is_needed(unit) {
            return Ok(unit.clone());
        }
        let mut children = unit.children().to_vec();
        let imports: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind() == JavaKind::Import)
            .map(|(i, _)| i)
            .collect();
        let package = children.iter().position(|c| c.kind() == JavaKind::Package);

        let (index, prefix) = match (imports.first(), imports.last()) {
            (Some(&first), Some(&last)) => {
                let after = imports
                    .iter()
                    .copied()
                    .find(|i| Import::cast(&children[*i]).is_some_and(|imp| imp.name() > self.fqn));
                match after {
                    // the new first import takes over the leading trivia
                    Some(i) if i == first => {
                        let prefix = children[i].prefix().to_string();
                        children[i] = children[i].with_prefix("\n");
                        (i, prefix)
                    }
                    Some(i) => (i, "\n".to_string()),
                    None => (last + 1, "\n".to_string()),
                }
            }
            _ => match package {
                Some(p) => {
                    if let Some(next) = children.get_mut(p + 1) {
                        *next = blank_line_before(next);
                    }
                    (p + 1, "\n\n".to_string())
                }
                None => {
                    let prefix = children.first().map(|c| c.prefix().to_string()).unwrap_or_default();
                    if let Some(first) = children.first_mut() {
                        *first = blank_line_before(&first.with_prefix(""));
                    }
                    (0, prefix)
                }
            },
        };

        let name = dotted_name(&self.fqn, Formatting::new(" "), |_| None)?;
        let import = Node::branch(
            JavaKind::Import,
            Formatting::new(prefix),
            vec![
                Node::token(JavaKind::Keyword, Formatting::EMPTY, "import"),
                name,
                Node::token(JavaKind::Semi, Formatting::EMPTY, ";"),
            ],
        )?;
        children.insert(index, import);
        debug!("Adding import {}", self.fqn);
        Ok(unit.with_children(children)?)
    }
}

/// `node` starting after an empty line
fn blank_line_before(node: &Node<Java>) -> Node<Java> {
    let prefix = node.prefix();
    if prefix.matches('\n').count() >= 2 {
        return node.clone();
    }
    node.with_prefix(format!("\n\n{}", prefix.trim_start_matches(['\n', '\r'])))
}

impl RefactorVisitor<Java> for AddImport {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn validate(&self) -> Validated {
        Validated::not_blank("type", Some(self.fqn.as_str()))
    }

    fn refactor(&self, source: &SourceFile<Java>, _ctx: &mut RefactorContext<Java>) -> Result<Node<Java>> {
        self.apply(&source.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JavaParser;
    use remold_core::{TypeCache, print};
    use std::sync::Arc;

    fn add(fqn: &str, text: &str) -> String {
        let unit = JavaParser::new(Arc::new(TypeCache::new()))
            .parse(&[text])
            .unwrap()
            .remove(0);
        print(&AddImport::new(fqn).apply(&unit.root).unwrap())
    }

    #[test]
    fn test_first_import_without_package() {
        assert_eq!(add("b.B", "class A {}"), "import b.B;\n\nclass A {}");
        assert_eq!(
            add("b.B", "// header\nclass A {}"),
            "// header\nimport b.B;\n\nclass A {}"
        );
    }

    #[test]
    fn test_first_import_after_package() {
        assert_eq!(
            add("b.B", "package a;\n\nclass A {}"),
            "package a;\n\nimport b.B;\n\nclass A {}"
        );
        assert_eq!(
            add("b.B", "package a;\nclass A {}"),
            "package a;\n\nimport b.B;\n\nclass A {}"
        );
    }

    #[test]
    fn test_sorted_position() {
        let text = "import b.B;\nimport d.D;\n\nclass A {}";
        assert_eq!(add("c.C", text), "import b.B;\nimport c.C;\nimport d.D;\n\nclass A {}");
        assert_eq!(add("a.A0", text), "import a.A0;\nimport b.B;\nimport d.D;\n\nclass A {}");
        assert_eq!(add("e.E", text), "import b.B;\nimport d.D;\nimport e.E;\n\nclass A {}");
    }

    #[test]
    fn test_visible_classes_not_imported() {
        for fqn in ["java.lang.String", "a.Other", "Local", "java.util.List"] {
            let text = "package a;\nimport java.util.*;\nclass A {}";
            assert_eq!(add(fqn, text), text);
        }
    }
}
