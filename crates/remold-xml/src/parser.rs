//! Lossless XML parser
//!
//! A single pass over the input builds the tree directly. Whitespace and
//! comments (plus any DOCTYPE declaration, and processing instructions other
//! than the prolog) are collected as the prefix of the token that follows them; text content keeps its trailing whitespace out of
//! the token so that it becomes the prefix of the closing tag instead.

use std::path::{Path, PathBuf};

use remold_core::{Formatting, Node, Parser, RemoldError, Result, SourceFile};
use tracing::debug;

use crate::syntax::{Xml, XmlKind};

/// Parser for XML documents
#[derive(Debug, Clone, Default)]
pub struct XmlParser;

impl XmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse text into a document tree
    pub fn parse_document(&self, path: &Path, text: &str) -> Result<Node<Xml>> {
        let mut scanner = Scanner {
            src: text,
            pos: 0,
            path: path.to_path_buf(),
        };
        scanner.document()
    }
}

impl Parser<Xml> for XmlParser {
    fn parse_str(&self, path: &Path, text: &str) -> Result<SourceFile<Xml>> {
        let root = self.parse_document(path, text)?;
        debug!("Parsed XML document '{}'", path.display());
        Ok(SourceFile::new(path, root))
    }
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
    path: PathBuf,
}

impl<'s> Scanner<'s> {
    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn at(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn error(&self, message: impl Into<String>) -> RemoldError {
        RemoldError::parse_error(&self.path, self.pos, message)
    }

    /// Consume up to and including `end`
    fn take_through(&mut self, end: &str, what: &str) -> Result<&'s str> {
        let start = self.pos;
        match self.rest().find(end) {
            Some(idx) => {
                self.pos += idx + end.len();
                Ok(&self.src[start..self.pos])
            }
            None => Err(self.error(format!("unterminated {what}"))),
        }
    }

    fn whitespace(&mut self) -> String {
        let len = self
            .rest()
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.rest().len());
        let ws = &self.src[self.pos..self.pos + len];
        self.pos += len;
        ws.to_string()
    }

    /// Whitespace, comments and DOCTYPE declarations, plus processing
    /// instructions when `instructions` is set
    fn trivia(&mut self, instructions: bool) -> Result<String> {
        let mut trivia = String::new();
        loop {
            trivia.push_str(&self.whitespace());
            if self.at("<!--") {
                trivia.push_str(self.take_through("-->", "comment")?);
            } else if instructions && self.at("<?") {
                trivia.push_str(self.take_through("?>", "processing instruction")?);
            } else if self.at("<!DOCTYPE") {
                trivia.push_str(self.take_through(">", "doctype")?);
            } else {
                return Ok(trivia);
            }
        }
    }

    fn token(&mut self, kind: XmlKind, prefix: String, len: usize) -> Node<Xml> {
        let text = &self.src[self.pos..self.pos + len];
        self.pos += len;
        Node::token(kind, Formatting::new(prefix), text)
    }

    fn name(&mut self, kind: XmlKind, prefix: String) -> Result<Node<Xml>> {
        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        Ok(self.token(kind, prefix, len))
    }

    fn expect(&mut self, kind: XmlKind, prefix: String, text: &str) -> Result<Node<Xml>> {
        if !self.at(text) {
            return Err(self.error(format!("expected '{text}'")));
        }
        Ok(self.token(kind, prefix, text.len()))
    }

    fn document(&mut self) -> Result<Node<Xml>> {
        let mut children = Vec::new();
        let mut prefix = self.trivia(false)?;
        if self.at("<?") {
            let start = self.pos;
            self.take_through("?>", "prolog")?;
            let text = &self.src[start..self.pos];
            children.push(Node::token(XmlKind::Prolog, Formatting::new(prefix), text));
            prefix = self.trivia(true)?;
        }
        children.push(self.tag(prefix)?);
        let suffix = self.trivia(true)?;
        if !self.rest().is_empty() {
            return Err(self.error("content after the root element"));
        }
        let document = Node::enclose(XmlKind::Document, children)?;
        Ok(document.with_formatting(document.formatting().with_suffix(suffix)))
    }

    fn tag(&mut self, prefix: String) -> Result<Node<Xml>> {
        let mut children = vec![self.expect(XmlKind::Lt, prefix, "<")?];
        let name = self.name(XmlKind::Name, String::new())?;
        let tag_name = name.text().unwrap_or_default().to_string();
        children.push(name);

        loop {
            let ws = self.whitespace();
            if self.at("/>") {
                children.push(self.token(XmlKind::SlashGt, ws, 2));
                return Ok(Node::enclose(XmlKind::Tag, children)?);
            }
            if self.at(">") {
                children.push(self.token(XmlKind::Gt, ws, 1));
                break;
            }
            children.push(self.attribute(ws)?);
        }

        loop {
            let ws = self.trivia(true)?;
            if self.rest().is_empty() {
                return Err(self.error(format!("unclosed element <{tag_name}>")));
            }
            if self.at("</") {
                children.push(self.token(XmlKind::LtSlash, ws, 2));
                let close = self.name(XmlKind::Name, String::new())?;
                if close.text() != Some(tag_name.as_str()) {
                    return Err(self.error(format!(
                        "closing tag </{}> does not match <{}>",
                        close.text().unwrap_or_default(),
                        tag_name
                    )));
                }
                children.push(close);
                let ws = self.whitespace();
                children.push(self.expect(XmlKind::Gt, ws, ">")?);
                return Ok(Node::enclose(XmlKind::Tag, children)?);
            }
            if self.at("<![CDATA[") {
                let start = self.pos;
                self.take_through("]]>", "CDATA section")?;
                let text = &self.src[start..self.pos];
                children.push(Node::token(XmlKind::CData, Formatting::new(ws), text));
            } else if self.at("<") {
                children.push(self.tag(ws)?);
            } else {
                let raw_len = self.rest().find('<').unwrap_or(self.rest().len());
                let raw = &self.rest()[..raw_len];
                let len = raw.trim_end().len();
                children.push(self.token(XmlKind::CharData, ws, len));
            }
        }
    }

    fn attribute(&mut self, prefix: String) -> Result<Node<Xml>> {
        let name = self.name(XmlKind::AttrName, prefix)?;
        let ws = self.whitespace();
        let eq = self.expect(XmlKind::Eq, ws, "=")?;
        let ws = self.whitespace();
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a quoted attribute value")),
        };
        let close = self.rest()[1..]
            .find(quote)
            .ok_or_else(|| self.error("unterminated attribute value"))?;
        let value = self.token(XmlKind::AttrValue, ws, close + 2);
        Ok(Node::enclose(XmlKind::Attribute, vec![name, eq, value])?)
    }
}
