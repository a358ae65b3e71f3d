//! Read access to YAML trees by dotted property path

use std::borrow::Cow;

use remold_core::{Node, NodeId, Property, PropertySource};

use crate::syntax::{Yaml, YamlKind};

/// Documents of a parsed file; a lone document stands for itself
pub fn documents(root: &Node<Yaml>) -> Vec<&Node<Yaml>> {
    match root.kind() {
        YamlKind::Stream => root.children_of(YamlKind::Document).collect(),
        _ => vec![root],
    }
}

/// Top-level mapping of a document, if it has one
pub fn root_mapping(document: &Node<Yaml>) -> Option<&Node<Yaml>> {
    document.child_of(YamlKind::Mapping)
}

/// Key of an entry with any quotes removed
pub fn key(entry: &Node<Yaml>) -> Option<Cow<'_, str>> {
    entry.child_of(YamlKind::Key)?.text().map(unquote)
}

/// Value of an entry or sequence item
pub fn value(node: &Node<Yaml>) -> Option<&Node<Yaml>> {
    node.children().iter().find(|c| c.kind().is_value())
}

/// The text a scalar stands for
///
/// Quotes are removed and escapes undone; block scalars are returned with the
/// header line dropped and the common indentation removed.
pub fn scalar_value(scalar: &Node<Yaml>) -> Option<String> {
    let text = scalar.text()?;
    if text.starts_with(['|', '>']) {
        let lines: Vec<&str> = text.lines().skip(1).collect();
        let indent = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start_matches(' ').len())
            .min()
            .unwrap_or(0);
        let body: Vec<&str> = lines.iter().map(|l| l.get(indent..).unwrap_or("")).collect();
        return Some(body.join("\n"));
    }
    Some(unquote(text).into_owned())
}

fn unquote(text: &str) -> Cow<'_, str> {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        Cow::Owned(text[1..text.len() - 1].replace("''", "'"))
    } else if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        let inner = &text[1..text.len() - 1];
        if !inner.contains('\\') {
            return Cow::Borrowed(inner);
        }
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// A mapping entry reached through nested mappings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath {
    /// Keys from the root joined with `.`
    pub path: String,
    /// Entry ids from the outermost to the entry itself
    pub chain: Vec<NodeId>,
}

impl EntryPath {
    pub fn id(&self) -> NodeId {
        self.chain[self.chain.len() - 1]
    }
}

/// Every entry reachable from the root mapping through mapping values, in
/// document order
pub fn entry_paths(document: &Node<Yaml>) -> Vec<EntryPath> {
    fn walk(mapping: &Node<Yaml>, prefix: &str, chain: &[NodeId], out: &mut Vec<EntryPath>) {
        for entry in mapping.children_of(YamlKind::Entry) {
            let Some(key) = key(entry) else { continue };
            let path = if prefix.is_empty() {
                key.into_owned()
            } else {
                format!("{prefix}.{key}")
            };
            let mut entry_chain = chain.to_vec();
            entry_chain.push(entry.id());
            out.push(EntryPath {
                path: path.clone(),
                chain: entry_chain.clone(),
            });
            if let Some(nested) = value(entry).filter(|v| v.kind() == YamlKind::Mapping) {
                walk(nested, &path, &entry_chain, out);
            }
        }
    }

    let mut out = Vec::new();
    if let Some(mapping) = root_mapping(document) {
        walk(mapping, "", &[], &mut out);
    }
    out
}

/// The entry whose dotted path is exactly `path`
pub fn find_entry(document: &Node<Yaml>, path: &str) -> Option<EntryPath> {
    entry_paths(document).into_iter().find(|e| e.path == path)
}

/// Scalar leaf entries as properties named by their dotted path
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlProperties;

impl PropertySource<Yaml> for YamlProperties {
    fn properties(&self, root: &Node<Yaml>) -> Vec<Property> {
        documents(root)
            .into_iter()
            .flat_map(entry_paths)
            .filter_map(|entry| {
                let scalar = value(root.find(entry.id())?)
                    .filter(|v| v.kind() == YamlKind::Scalar)?;
                Some(Property {
                    value: scalar_value(scalar)?,
                    node: scalar.id(),
                    name: entry.path,
                })
            })
            .collect()
    }
}
