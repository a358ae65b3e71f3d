//! Fold single-entry mappings into dotted keys

use remold_core::{Handlers, Node, RefactorContext, RefactorVisitor, Result, SourceFile, column_of, visit};

use crate::change_key::reindent;
use crate::syntax::{Yaml, YamlKind};

/// Rewrite `a:\n  b: 1` as `a.b: 1`
///
/// Applies bottom-up, so chains of single-entry mappings collapse into one
/// key. Mappings carrying comments and quoted keys are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalesceProperties;

impl CoalesceProperties {
    pub const TYPE: &'static str = "yaml.CoalesceProperties";

    pub fn apply(&self, document: &Node<Yaml>) -> Result<Node<Yaml>> {
        let mut handlers = Handlers::new().on(YamlKind::Entry, |entry: Node<Yaml>, cursor| {
            let root = cursor.path().last().map_or_else(|| entry.clone(), |c| c.node().clone());
            coalesce(&entry, column_of(&root, entry.id()))
        });
        visit(&mut handlers, document)
    }
}

fn coalesce(entry: &Node<Yaml>, column: Option<usize>) -> Result<Node<Yaml>> {
    let (Some(key), Some(mapping)) = (entry.child_of(YamlKind::Key), entry.child_of(YamlKind::Mapping))
    else {
        return Ok(entry.clone());
    };
    let [child] = mapping.children() else {
        return Ok(entry.clone());
    };
    let (Some(child_key), Some(child_column), Some(column)) =
        (child.child_of(YamlKind::Key), mapping.formatting().indent(), column)
    else {
        return Ok(entry.clone());
    };
    let (Some(outer), Some(inner)) = (key.text(), child_key.text()) else {
        return Ok(entry.clone());
    };
    if mapping.prefix().contains('#') || is_quoted(outer) || is_quoted(inner) {
        return Ok(entry.clone());
    }

    let delta = column as isize - child_column.len() as isize;
    let mut children = vec![key.with_text(format!("{outer}.{inner}"))?];
    for grandchild in child.children().iter().skip(1) {
        children.push(reindent(grandchild, delta)?);
    }
    Ok(entry.with_children(children)?)
}

fn is_quoted(key: &str) -> bool {
    key.starts_with(['"', '\''])
}

impl RefactorVisitor<Yaml> for CoalesceProperties {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn refactor(&self, source: &SourceFile<Yaml>, _ctx: &mut RefactorContext<Yaml>) -> Result<Node<Yaml>> {
        self.apply(&source.root)
    }
}
