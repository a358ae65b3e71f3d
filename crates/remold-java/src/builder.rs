//! Building new subtrees for insertion into existing units
//!
//! Snippets are parsed inside a stub unit that repeats the target unit's
//! package and imports and declares the variables visible at the insertion
//! point, so the resulting nodes come out attributed. They are handed back
//! with inferred formatting and take their indentation from wherever they are
//! inserted.

use std::collections::HashSet;
use std::path::PathBuf;

use remold_core::{Cursor, Formatting, Node, Parser, RemoldError, Result, SourceFile, TypeId, print, print_trimmed};
use tracing::debug;

use crate::parser::JavaParser;
use crate::syntax::{Java, JavaKind};
use crate::view::{AstNode, Block, CompilationUnit, MethodDecl, VariableDecls};

const SNIPPET_CLASS: &str = "__Snippet";
const SNIPPET_METHOD: &str = "__snippet";

/// A dotted name as an identifier or a chain of field accesses
///
/// `ty_of` is asked for the type of every prefix of the name.
pub(crate) fn dotted_name(
    name: &str,
    formatting: Formatting,
    ty_of: impl Fn(&str) -> Option<TypeId>,
) -> Result<Node<Java>> {
    let mut segments = name.split('.');
    let first = segments.next().unwrap_or_default();
    let mut node = Node::token(JavaKind::Ident, formatting, first).with_type(ty_of(first));
    let mut prefix = first.to_string();
    for segment in segments {
        prefix.push('.');
        prefix.push_str(segment);
        node = Node::branch(
            JavaKind::FieldAccess,
            node.formatting().clone(),
            vec![
                node.with_formatting(Formatting::EMPTY),
                Node::token(JavaKind::Dot, Formatting::EMPTY, "."),
                Node::token(JavaKind::Ident, Formatting::EMPTY, segment),
            ],
        )?
        .with_type(ty_of(&prefix));
    }
    Ok(node)
}

/// Builds attributed subtrees from source text
pub struct TreeBuilder<'p> {
    parser: &'p JavaParser,
}

impl<'p> TreeBuilder<'p> {
    pub fn new(parser: &'p JavaParser) -> Self {
        Self { parser }
    }

    /// A qualified name such as `java.util.List` or `a.A.*`
    ///
    /// Segments starting with an upper-case letter are typed as classes
    /// named by the name up to and including that segment.
    pub fn build_name(&self, name: &str, formatting: Formatting) -> Result<Node<Java>> {
        let cache = self.parser.cache();
        dotted_name(name, formatting, |prefix| {
            let last = prefix.rsplit('.').next().unwrap_or(prefix);
            last.starts_with(|c: char| c.is_ascii_uppercase())
                .then(|| cache.build_class(prefix))
        })
    }

    /// Statements parsed as if written at `cursor` inside `unit`
    pub fn build_snippet(
        &self,
        unit: &SourceFile<Java>,
        cursor: &Cursor<Java>,
        snippet: &str,
    ) -> Result<Vec<Node<Java>>> {
        let fields: String = visible_variables(cursor)
            .into_iter()
            .map(|(ty, name)| format!("{ty} {name};\n"))
            .collect();
        let stub = format!(
            "{}class {SNIPPET_CLASS} {{\n{fields}void {SNIPPET_METHOD}() {{\n{snippet}\n}}\n}}\n",
            header(unit, &[])
        );
        let method = self.parse_stub(unit, &stub, SNIPPET_CLASS)?;
        let body = MethodDecl::cast(&method)
            .filter(|m| m.name() == SNIPPET_METHOD)
            .and_then(|m| m.body())
            .ok_or_else(|| stub_error(unit, "snippet method has no body"))?;
        let statements: Vec<Node<Java>> = body
            .statements()
            .map(|s| s.with_formatting(Formatting::infer().with_suffix(s.suffix())))
            .collect();
        debug!("Built {} statements from snippet", statements.len());
        Ok(statements)
    }

    /// A method declaration parsed as a member of a class of `unit`
    ///
    /// `imports` names classes the method refers to beyond those `unit`
    /// already imports.
    pub fn build_method(
        &self,
        unit: &SourceFile<Java>,
        source: &str,
        imports: &[&str],
    ) -> Result<Node<Java>> {
        let stub = format!(
            "{}class {SNIPPET_CLASS} {{\n{source}\n}}\n",
            header(unit, imports)
        );
        let method = self.parse_stub(unit, &stub, SNIPPET_CLASS)?;
        Ok(method.with_formatting(Formatting::infer().with_suffix(method.suffix())))
    }

    /// Parse `stub` next to `unit` and return the first method of `class`
    fn parse_stub(&self, unit: &SourceFile<Java>, stub: &str, class: &str) -> Result<Node<Java>> {
        let package = CompilationUnit::cast(&unit.root)
            .map(|u| u.package_name())
            .unwrap_or_default();
        let mut path: PathBuf = package.split('.').filter(|s| !s.is_empty()).collect();
        path.push(format!("{class}.java"));
        let parsed = self.parser.parse_all(&[
            (path, stub.to_string()),
            (unit.path.clone(), print(&unit.root)),
        ])?;
        let root = &parsed
            .first()
            .ok_or_else(|| stub_error(unit, "stub was not parsed"))?
            .root;
        CompilationUnit::cast(root)
            .and_then(|u| u.classes().find(|c| c.name() == class))
            .and_then(|c| c.methods().next())
            .map(|m| m.syntax().clone())
            .ok_or_else(|| stub_error(unit, "stub declares no method"))
    }
}

fn stub_error(unit: &SourceFile<Java>, message: &str) -> RemoldError {
    RemoldError::parse_error(&unit.path, 0, message)
}

/// Package and import declarations of `unit`, plus imports of `extra`
fn header(unit: &SourceFile<Java>, extra: &[&str]) -> String {
    let mut header: String = unit
        .root
        .children()
        .iter()
        .filter(|c| matches!(c.kind(), JavaKind::Package | JavaKind::Import))
        .map(|c| format!("{}\n", print_trimmed(c)))
        .collect();
    for import in extra {
        header.push_str(&format!("import {import};\n"));
    }
    header
}

/// Type text and name of every variable visible at `cursor`, innermost first
///
/// Shadowed variables are left out.
fn visible_variables(cursor: &Cursor<Java>) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut visible = Vec::new();
    let mut below: Option<usize> = None;
    for current in cursor.path() {
        let node = current.node();
        let declarations: Vec<VariableDecls> = match node.kind() {
            JavaKind::ClassBody => node.children().iter().filter_map(VariableDecls::cast).collect(),
            JavaKind::MethodDecl => MethodDecl::cast(node)
                .map(|m| m.params().collect())
                .unwrap_or_default(),
            JavaKind::Block => Block::cast(node)
                .map(|b| {
                    b.statements()
                        .take_while(|s| below.is_none_or(|i| node.index_of(s.id()) < Some(i)))
                        .filter_map(VariableDecls::cast)
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        for decls in declarations.iter().rev() {
            let Some(ty) = decls.type_expr().map(print_trimmed) else {
                continue;
            };
            for name in decls.names() {
                if seen.insert(name.to_string()) {
                    visible.push((ty.clone(), name.to_string()));
                }
            }
        }
        below = current.index_in_parent();
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use remold_core::{TypeCache, locate};
    use std::sync::Arc;

    #[test]
    fn test_visible_variables_shadow_outer_ones() {
        let parser = JavaParser::new(Arc::new(TypeCache::new()));
        let unit = parser
            .parse(&["class A {\n    int n;\n    String s;\n    void f(long n) {\n        int a;\n        { int b; }\n        int c;\n    }\n}"])
            .unwrap()
            .remove(0);
        let inner = unit
            .root
            .descendants()
            .filter(|n| n.kind() == JavaKind::Block)
            .nth(1)
            .unwrap();
        let cursor = locate(&unit.root, inner.id()).unwrap();
        let visible: Vec<String> = visible_variables(&cursor)
            .into_iter()
            .map(|(ty, name)| format!("{ty} {name}"))
            .collect();
        assert_eq!(visible, vec!["int b", "int a", "long n", "String s"]);
    }
}
