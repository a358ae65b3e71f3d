//! Element views and text rewriting

use std::borrow::Cow;

use remold_core::{Formatting, Node, Result};

use crate::syntax::{Xml, XmlKind};

/// Read-only view over a `Tag` node
#[derive(Debug, Clone, Copy)]
pub struct Tag<'a> {
    node: &'a Node<Xml>,
}

impl<'a> Tag<'a> {
    pub fn cast(node: &'a Node<Xml>) -> Option<Self> {
        (node.kind() == XmlKind::Tag).then_some(Self { node })
    }

    pub fn node(&self) -> &'a Node<Xml> {
        self.node
    }

    pub fn name(&self) -> &'a str {
        self.node
            .child_of(XmlKind::Name)
            .and_then(Node::text)
            .unwrap_or_default()
    }

    /// Decoded value of an attribute
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.node.children_of(XmlKind::Attribute).find_map(|attr| {
            let key = attr.child_of(XmlKind::AttrName)?.text()?;
            if key != name {
                return None;
            }
            let raw = attr.child_of(XmlKind::AttrValue)?.text()?;
            Some(decode(unquote(raw)).into_owned())
        })
    }

    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = Tag<'a>> + 'a {
        self.node.children().iter().filter_map(Tag::cast)
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<Tag<'a>> {
        self.children().find(|t| t.name() == name)
    }

    pub fn children_named<'n>(&self, name: &'n str) -> impl Iterator<Item = Tag<'a>> + 'n
    where
        'a: 'n,
    {
        self.children().filter(move |t| t.name() == name)
    }

    /// Follow a `/`-separated path of child names
    pub fn find(&self, path: &str) -> Option<Tag<'a>> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(*self, |tag, segment| tag.child(segment))
    }

    /// Every element reached by a `/`-separated path of child names
    pub fn find_all(&self, path: &str) -> Vec<Tag<'a>> {
        let mut current = vec![*self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .iter()
                .flat_map(|tag| tag.children_named(segment).collect::<Vec<_>>())
                .collect();
        }
        current
    }

    /// Decoded text content, `None` when the element has none
    pub fn value(&self) -> Option<String> {
        let mut value = String::new();
        let mut found = false;
        for child in self.node.children() {
            match (child.kind(), child.text()) {
                (XmlKind::CharData, Some(text)) => {
                    if found {
                        value.push_str(child.prefix());
                    }
                    value.push_str(&decode(text));
                    found = true;
                }
                (XmlKind::CData, Some(text)) => {
                    if found {
                        value.push_str(child.prefix());
                    }
                    let inner = text
                        .strip_prefix("<![CDATA[")
                        .and_then(|t| t.strip_suffix("]]>"))
                        .unwrap_or(text);
                    value.push_str(inner);
                    found = true;
                }
                _ => {}
            }
        }
        found.then_some(value)
    }

    /// The first text token of the element
    pub fn value_token(&self) -> Option<&'a Node<Xml>> {
        self.node.child_of(XmlKind::CharData)
    }

    pub fn is_self_closing(&self) -> bool {
        self.node.child_of(XmlKind::SlashGt).is_some()
    }
}

/// The root element of a document
pub fn root_tag(document: &Node<Xml>) -> Option<Tag<'_>> {
    match document.kind() {
        XmlKind::Document => document.child_of(XmlKind::Tag).and_then(Tag::cast),
        XmlKind::Tag => Tag::cast(document),
        _ => None,
    }
}

fn unquote(raw: &str) -> &str {
    if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

const ENTITIES: [(&str, char); 5] = [
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&apos;", '\''),
];

/// Resolve the predefined entities and numeric character references
pub fn decode(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let Some(end) = rest.find(';') else { break };
        let entity = &rest[..=end];
        let resolved = ENTITIES
            .iter()
            .find(|(name, _)| *name == entity)
            .map(|(_, c)| *c)
            .or_else(|| {
                let number = entity.strip_prefix("&#")?.strip_suffix(';')?;
                let code = match number.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                    None => number.parse().ok()?,
                };
                char::from_u32(code)
            });
        match resolved {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape text for use as element content
pub fn encode(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Replace the text content of an element
///
/// The existing text token keeps its identity and prefix. An empty element
/// gains a text token, and a self-closing one is expanded to an open and
/// close tag pair.
pub fn with_value(tag: &Node<Xml>, value: &str) -> Result<Node<Xml>> {
    let text = encode(value);
    let children = tag.children();

    if let Some(index) = children.iter().position(|c| c.kind() == XmlKind::CharData) {
        let token = children[index].with_text(text.as_ref())?;
        return Ok(tag.with_child(index, token)?);
    }

    let value_token = Node::token(XmlKind::CharData, Formatting::EMPTY, text.as_ref());
    if let Some(gt) = children.iter().position(|c| c.kind() == XmlKind::Gt) {
        let mut updated = children.to_vec();
        updated.insert(gt + 1, value_token);
        return Ok(tag.with_children(updated)?);
    }

    let name = Tag::cast(tag).map(|t| t.name()).unwrap_or_default();
    let mut updated: Vec<_> = children
        .iter()
        .filter(|c| c.kind() != XmlKind::SlashGt)
        .cloned()
        .collect();
    updated.extend([
        Node::token(XmlKind::Gt, Formatting::EMPTY, ">"),
        value_token,
        Node::token(XmlKind::LtSlash, Formatting::EMPTY, "</"),
        Node::token(XmlKind::Name, Formatting::EMPTY, name),
        Node::token(XmlKind::Gt, Formatting::EMPTY, ">"),
    ]);
    Ok(tag.with_children(updated)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XmlParser;
    use remold_core::print;
    use std::path::Path;

    fn parse(text: &str) -> Node<Xml> {
        XmlParser::new()
            .parse_document(Path::new("t.xml"), text)
            .unwrap()
    }

    #[test]
    fn test_navigation() {
        let doc = parse(
            r#"<project><deps><dep scope="test"><id>a</id></dep><dep><id>b &amp; c</id></dep></deps></project>"#,
        );
        let root = root_tag(&doc).unwrap();
        assert_eq!(root.name(), "project");
        let deps = root.find_all("deps/dep");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].attribute("scope").as_deref(), Some("test"));
        assert_eq!(deps[1].find("id").and_then(|t| t.value()).as_deref(), Some("b & c"));
        assert!(root.find("deps/missing").is_none());
    }

    #[test]
    fn test_decode_encode() {
        assert_eq!(decode("a &lt;b&gt; &#65;&#x42; &bogus; &"), "a <b> AB &bogus; &");
        assert_eq!(encode("1 < 2 & 3"), "1 &lt; 2 &amp; 3");
        assert!(matches!(encode("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_with_value_replaces_text() {
        let doc = parse("<v>\n  1.0\n</v>");
        let tag = root_tag(&doc).unwrap().node().clone();
        let old = Tag::cast(&tag).unwrap().value_token().unwrap().id();
        let updated = with_value(&tag, "2.0").unwrap();
        assert_eq!(print(&updated), "<v>\n  2.0\n</v>");
        assert_eq!(Tag::cast(&updated).unwrap().value_token().unwrap().id(), old);
    }

    #[test]
    fn test_with_value_fills_empty_and_self_closing() {
        let doc = parse("<v></v>");
        let tag = root_tag(&doc).unwrap().node().clone();
        assert_eq!(print(&with_value(&tag, "x").unwrap()), "<v>x</v>");

        let doc = parse(r#"<v a="1" />"#);
        let tag = root_tag(&doc).unwrap().node().clone();
        assert_eq!(print(&with_value(&tag, "a&b").unwrap()), r#"<v a="1">a&amp;b</v>"#);
    }
}
