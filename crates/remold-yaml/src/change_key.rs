//! Rename a property, moving it between nested mappings when needed

use remold_core::{
    Node, NodeId, RefactorContext, RefactorVisitor, RemoldError, Result, SourceFile, Validated,
    VisitorConfig, column_of,
    formatting::{shift_lines, unshift_lines},
    locate,
};
use tracing::debug;

use crate::coalesce::CoalesceProperties;
use crate::syntax::{Yaml, YamlKind};
use crate::view::{EntryPath, entry_paths, find_entry, root_mapping};

/// Change the dotted key of a property
///
/// When the old and new keys share a prefix that is spelled as a nested
/// mapping, the entry moves under the deepest shared mapping with the rest of
/// the new key; mappings left empty by the move are removed. Afterwards
/// [`CoalesceProperties`] folds single-entry mappings into dotted keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePropertyKey {
    pub property: String,
    pub to_property: String,
}

impl ChangePropertyKey {
    pub const TYPE: &'static str = "yaml.ChangePropertyKey";

    pub fn new(property: impl Into<String>, to_property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            to_property: to_property.into(),
        }
    }

    pub fn from_config(config: &VisitorConfig) -> Result<Self> {
        config
            .required("property")
            .and(config.required("toProperty"))
            .into_result()?;
        let visitor = Self::new(
            config.string("property").unwrap_or_default(),
            config.string("toProperty").unwrap_or_default(),
        );
        visitor.validate().into_result()?;
        Ok(visitor)
    }

    pub fn validate(&self) -> Validated {
        Validated::not_blank("property", Some(self.property.as_str()))
            .and(Validated::not_blank("toProperty", Some(self.to_property.as_str())))
    }

    /// Apply to each document of `root`, or `None` when none has the property
    pub fn apply_all(&self, root: &Node<Yaml>) -> Result<Option<Node<Yaml>>> {
        if root.kind() != YamlKind::Stream {
            return self.apply(root);
        }
        let mut children = root.children().to_vec();
        let mut changed = false;
        for child in children.iter_mut() {
            if let Some(updated) = self.apply(child)? {
                *child = updated;
                changed = true;
            }
        }
        if !changed {
            return Ok(None);
        }
        Ok(Some(root.with_children(children)?))
    }

    /// The rewritten document, or `None` when the property is absent
    pub fn apply(&self, document: &Node<Yaml>) -> Result<Option<Node<Yaml>>> {
        if self.property == self.to_property {
            return Ok(None);
        }
        let Some(found) = find_entry(document, &self.property) else {
            return Ok(None);
        };
        let paths = entry_paths(document);
        let ancestors = &found.chain[..found.chain.len() - 1];

        // deepest ancestor whose path prefixes the new key
        let shared = ancestors.iter().rposition(|id| {
            paths
                .iter()
                .find(|p| p.id() == *id)
                .is_some_and(|p| self.to_property.starts_with(&format!("{}.", p.path)))
        });
        let (target, remainder) = match shared {
            Some(index) => {
                let parent = ancestors[index];
                let parent_path = &paths
                    .iter()
                    .find(|p| p.id() == parent)
                    .ok_or_else(|| self.vanished(parent))?
                    .path;
                let mapping = document
                    .find(parent)
                    .and_then(|e| e.child_of(YamlKind::Mapping))
                    .ok_or_else(|| self.vanished(parent))?;
                (mapping.id(), &self.to_property[parent_path.len() + 1..])
            }
            None => {
                let mapping = root_mapping(document)
                    .ok_or_else(|| self.vanished(found.id()))?;
                (mapping.id(), self.to_property.as_str())
            }
        };

        let same_mapping = match shared {
            Some(index) => index + 2 == found.chain.len(),
            None => found.chain.len() == 1,
        };
        let updated = if same_mapping {
            self.rename_in_place(document, &found, remainder)?
        } else {
            self.move_entry(document, &found, target, remainder)?
        };
        debug!("Changed property key '{}' to '{}'", self.property, self.to_property);
        Ok(Some(updated))
    }

    fn rename_in_place(&self, document: &Node<Yaml>, found: &EntryPath, key: &str) -> Result<Node<Yaml>> {
        let key_id = document
            .find(found.id())
            .and_then(|e| e.child_of(YamlKind::Key))
            .map(Node::id)
            .ok_or_else(|| self.vanished(found.id()))?;
        let cursor = locate(document, key_id).ok_or_else(|| self.vanished(key_id))?;
        let renamed = cursor.node().with_text(key)?;
        cursor.replace(renamed)
    }

    fn move_entry(
        &self,
        document: &Node<Yaml>,
        found: &EntryPath,
        target: NodeId,
        key: &str,
    ) -> Result<Node<Yaml>> {
        let entry = document.find(found.id()).ok_or_else(|| self.vanished(found.id()))?;
        let from = column_of(document, entry.id()).ok_or_else(|| self.vanished(entry.id()))?;
        let to = column_of(document, target).ok_or_else(|| self.vanished(target))?;

        let key_node = entry
            .child_of(YamlKind::Key)
            .ok_or_else(|| self.vanished(entry.id()))?;
        let key_index = entry.index_of(key_node.id()).unwrap_or(0);
        let moved = reindent(entry, to as isize - from as isize)?
            .with_child(key_index, key_node.with_text(key)?)?
            .with_prefix(format!("\n{}", " ".repeat(to)));

        let root = root_mapping(document).ok_or_else(|| self.vanished(found.id()))?;
        let rebuilt = rebuild(root, &found.chain, target, &moved)?
            .ok_or_else(|| self.vanished(root.id()))?;
        let index = document.index_of(root.id()).ok_or_else(|| self.vanished(root.id()))?;
        Ok(document.with_child(index, rebuilt)?)
    }

    fn vanished(&self, id: NodeId) -> RemoldError {
        RemoldError::visitor_error(Self::TYPE, format!("node {id} is missing from the document"))
    }
}

/// Rebuild `mapping` without the entry at the end of `chain`, appending
/// `moved` to the mapping with id `target`
///
/// Returns `None` when the mapping is left with no entries.
fn rebuild(
    mapping: &Node<Yaml>,
    chain: &[NodeId],
    target: NodeId,
    moved: &Node<Yaml>,
) -> Result<Option<Node<Yaml>>> {
    let mut entries = mapping.children().to_vec();
    if let Some(index) = entries.iter().position(|e| e.id() == chain[0]) {
        if chain.len() == 1 {
            entries.remove(index);
        } else {
            let entry = entries[index].clone();
            let nested = entry.child_of(YamlKind::Mapping).cloned();
            if let Some(nested) = nested {
                let value_index = entry.index_of(nested.id()).unwrap_or(entry.children().len());
                match rebuild(&nested, &chain[1..], target, moved)? {
                    Some(nested) => entries[index] = entry.with_child(value_index, nested)?,
                    None => {
                        entries.remove(index);
                    }
                }
            }
        }
    }
    if mapping.id() == target {
        entries.push(moved.clone());
    }
    if entries.is_empty() {
        return Ok(None);
    }
    let first = mapping.children().first().map(Node::id);
    if first != Some(entries[0].id()) {
        // the mapping's own prefix already places its first entry
        entries[0] = entries[0].with_prefix("");
    }
    Ok(Some(mapping.with_children(entries)?))
}

/// Move every line of `node` after its first by `delta` columns
pub(crate) fn reindent(node: &Node<Yaml>, delta: isize) -> Result<Node<Yaml>> {
    if delta == 0 {
        return Ok(node.clone());
    }
    let shift = |text: &str| {
        if delta > 0 {
            shift_lines(text, &" ".repeat(delta.unsigned_abs()))
        } else {
            unshift_lines(text, delta.unsigned_abs())
        }
    };
    let shifted = node.with_prefix(shift(node.prefix()));
    match shifted.text() {
        Some(text) => {
            let text = shift(text);
            Ok(shifted.with_text(text)?)
        }
        None => {
            let children = shifted
                .children()
                .iter()
                .map(|c| reindent(c, delta))
                .collect::<Result<Vec<_>>>()?;
            Ok(shifted.with_children(children)?)
        }
    }
}

impl RefactorVisitor<Yaml> for ChangePropertyKey {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn validate(&self) -> Validated {
        ChangePropertyKey::validate(self)
    }

    fn refactor(&self, source: &SourceFile<Yaml>, ctx: &mut RefactorContext<Yaml>) -> Result<Node<Yaml>> {
        match self.apply_all(&source.root)? {
            Some(updated) => {
                ctx.and_then(CoalesceProperties);
                Ok(updated)
            }
            None => Ok(source.root.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use remold_core::print;

    use super::*;
    use crate::parser::YamlParser;

    fn apply(text: &str, from: &str, to: &str) -> Option<String> {
        let doc = YamlParser::new()
            .parse_document(Path::new("application.yml"), text)
            .unwrap();
        ChangePropertyKey::new(from, to)
            .apply(&doc)
            .unwrap()
            .map(|d| print(&d))
    }

    #[test]
    fn test_absent_property_is_untouched() {
        assert_eq!(apply("a.b: 1\n", "a.c", "a.d"), None);
        assert_eq!(apply("a.b: 1\n", "a.b", "a.b"), None);
    }

    #[test]
    fn test_rename_nested_key_in_place() {
        assert_eq!(
            apply("server:\n  port: 8080\n  host: x\n", "server.port", "server.http-port").as_deref(),
            Some("server:\n  http-port: 8080\n  host: x\n")
        );
    }

    #[test]
    fn test_move_to_root_reindents_nested_value() {
        assert_eq!(
            apply("a:\n  b:\n    list:\n      - x\n  c: 1\n", "a.b.list", "z.list").as_deref(),
            Some("a:\n  c: 1\nz.list:\n  - x\n")
        );
    }

    #[test]
    fn test_move_removes_first_entry_cleanly() {
        assert_eq!(
            apply("a:\n  b: 1\n  c: 2\n", "a.b", "d").as_deref(),
            Some("a:\n  c: 2\nd: 1\n")
        );
    }

    #[test]
    fn test_each_document_is_rewritten() {
        let stream = YamlParser::new()
            .parse_document(Path::new("application.yml"), "a:\n  b: 1\n---\nc: 2\n---\na:\n  b: 3\n")
            .unwrap();
        let updated = ChangePropertyKey::new("a.b", "a.d").apply_all(&stream).unwrap().unwrap();
        assert_eq!(print(&updated), "a:\n  d: 1\n---\nc: 2\n---\na:\n  d: 3\n");
        assert!(ChangePropertyKey::new("x", "y").apply_all(&stream).unwrap().is_none());
    }

    #[test]
    fn test_from_config_requires_options() {
        let config = VisitorConfig::new(ChangePropertyKey::TYPE).with_option("property", "a");
        assert!(ChangePropertyKey::from_config(&config).is_err());
        let config = config.with_option("toProperty", "b");
        assert_eq!(
            ChangePropertyKey::from_config(&config).unwrap(),
            ChangePropertyKey::new("a", "b")
        );
    }
}
