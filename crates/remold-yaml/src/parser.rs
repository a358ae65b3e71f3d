//! Lossless YAML parser
//!
//! Covers block mappings, block sequences (including compact `- key: value`
//! items), plain, quoted and block (`|`, `>`) scalars, and comments. Flow
//! collections are kept as opaque scalars. A `---` marker at the start of a
//! line opens a new document; text holding several documents parses to a
//! [`YamlKind::Stream`]. Structure follows indentation: a
//! value on a following line belongs to an entry when it is indented deeper
//! than the entry's key, or when it is a sequence at the key's column.
//!
//! Whitespace, line breaks and comments become the prefix of the next token.

use std::path::{Path, PathBuf};

use remold_core::{Formatting, Node, Parser, RemoldError, Result, SourceFile};
use tracing::debug;

use crate::syntax::{Yaml, YamlKind};

/// Parser for YAML documents
#[derive(Debug, Clone, Default)]
pub struct YamlParser;

impl YamlParser {
    pub fn new() -> Self {
        Self
    }

    /// A single [`YamlKind::Document`], or a [`YamlKind::Stream`] of them when
    /// `---` separates several
    pub fn parse_document(&self, path: &Path, text: &str) -> Result<Node<Yaml>> {
        Scanner {
            src: text,
            pos: 0,
            path: path.to_path_buf(),
        }
        .stream()
    }
}

impl Parser<Yaml> for YamlParser {
    fn parse_str(&self, path: &Path, text: &str) -> Result<SourceFile<Yaml>> {
        let root = self.parse_document(path, text)?;
        debug!("Parsed YAML document '{}'", path.display());
        Ok(SourceFile::new(path, root))
    }
}

/// What follows the current position once trivia is skipped
struct Lookahead {
    trivia: String,
    pos: usize,
    column: usize,
    newline: bool,
    at_end: bool,
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
    path: PathBuf,
}

impl<'s> Scanner<'s> {
    fn rest_at(&self, pos: usize) -> &'s str {
        &self.src[pos..]
    }

    fn line_at(&self, pos: usize) -> &'s str {
        let rest = self.rest_at(pos);
        &rest[..rest.find('\n').unwrap_or(rest.len())]
    }

    fn column_at(&self, pos: usize) -> usize {
        let line_start = self.src[..pos].rfind('\n').map_or(0, |i| i + 1);
        self.src[line_start..pos].chars().count()
    }

    fn error(&self, message: impl Into<String>) -> RemoldError {
        RemoldError::parse_error(&self.path, self.pos, message)
    }

    fn trivia(&mut self) -> String {
        let start = self.pos;
        loop {
            let rest = self.rest_at(self.pos);
            self.pos += rest.len() - rest.trim_start_matches([' ', '\t', '\r', '\n']).len();
            if self.rest_at(self.pos).starts_with('#') {
                self.pos += self.line_at(self.pos).len();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn lookahead(&mut self) -> Lookahead {
        let save = self.pos;
        let trivia = self.trivia();
        let lookahead = Lookahead {
            newline: trivia.contains('\n') || save == 0,
            pos: self.pos,
            column: self.column_at(self.pos),
            at_end: self.pos == self.src.len(),
            trivia,
        };
        self.pos = save;
        lookahead
    }

    fn token(&mut self, kind: YamlKind, prefix: String, len: usize) -> Node<Yaml> {
        let text = &self.src[self.pos..self.pos + len];
        self.pos += len;
        Node::token(kind, Formatting::new(prefix), text)
    }

    fn whitespace(&mut self) -> String {
        let rest = self.rest_at(self.pos);
        let len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        self.pos += len;
        rest[..len].to_string()
    }

    fn is_dash(&self, pos: usize) -> bool {
        let rest = self.rest_at(pos);
        rest.starts_with('-') && matches!(rest[1..].chars().next(), None | Some(' ' | '\t' | '\r' | '\n'))
    }

    /// Byte offset of the `:` ending a mapping key on the line at `pos`
    fn key_colon(&self, pos: usize) -> Option<usize> {
        let line = self.line_at(pos);
        if line.starts_with(['[', '{', '|', '>', '#']) || self.is_dash(pos) {
            return None;
        }
        let bytes = line.as_bytes();
        let mut i = match line.chars().next() {
            Some(q @ ('"' | '\'')) => closing_quote(line, q)? + 1,
            _ => 0,
        };
        while i < bytes.len() {
            match bytes[i] {
                b':' if matches!(bytes.get(i + 1).copied(), None | Some(b' ' | b'\t' | b'\r')) => {
                    return Some(i);
                }
                b'#' if i > 0 && matches!(bytes[i - 1], b' ' | b'\t') => return None,
                _ => i += 1,
            }
        }
        None
    }

    /// Whether a `---` document marker starts at `pos`
    fn is_doc_start(&self, pos: usize) -> bool {
        let rest = self.rest_at(pos);
        self.column_at(pos) == 0
            && rest.starts_with("---")
            && matches!(rest[3..].chars().next(), None | Some(' ' | '\t' | '\r' | '\n'))
    }

    fn stream(&mut self) -> Result<Node<Yaml>> {
        let mut documents = vec![self.document()?];
        while self.pos < self.src.len() {
            documents.push(self.document()?);
        }
        if documents.len() == 1 {
            return Ok(documents.remove(0));
        }
        debug!("Parsed a stream of {} documents", documents.len());
        Ok(Node::branch(YamlKind::Stream, Formatting::EMPTY, documents)?)
    }

    /// One document, stopping before the marker of the next
    fn document(&mut self) -> Result<Node<Yaml>> {
        let mut children = Vec::new();
        let start = self.lookahead();
        if self.is_doc_start(start.pos) {
            self.pos = start.pos;
            children.push(self.token(YamlKind::DocStart, start.trivia, 3));
        }
        let next = self.lookahead();
        if !next.at_end && !self.is_doc_start(next.pos) {
            self.pos = next.pos;
            children.push(self.node(next.trivia, None)?);
        }
        let next = self.lookahead();
        if !next.at_end {
            if self.is_doc_start(next.pos) && !children.is_empty() {
                // comments before the marker belong to the next document
                return Ok(Node::branch(YamlKind::Document, Formatting::EMPTY, children)?);
            }
            self.pos = next.pos;
            return Err(self.error(format!(
                "unexpected content at column {}",
                self.column_at(self.pos)
            )));
        }
        let suffix = self.trivia();
        // leading comments stay with the first child so that trimmed printing keeps them
        Ok(Node::branch(
            YamlKind::Document,
            Formatting::EMPTY.with_suffix(suffix),
            children,
        )?)
    }

    /// A value starting at the current position; `parent` is the column of the owning key or dash
    fn node(&mut self, prefix: String, parent: Option<usize>) -> Result<Node<Yaml>> {
        let column = self.column_at(self.pos);
        if self.is_dash(self.pos) {
            self.sequence(prefix, column)
        } else if self.key_colon(self.pos).is_some() {
            self.mapping(prefix, column)
        } else {
            self.scalar(prefix, parent)
        }
    }

    fn mapping(&mut self, prefix: String, column: usize) -> Result<Node<Yaml>> {
        let mut entries = vec![self.entry(prefix, column)?];
        loop {
            let next = self.lookahead();
            if next.at_end
                || !next.newline
                || next.column != column
                || self.key_colon(next.pos).is_none()
            {
                break;
            }
            self.pos = next.pos;
            entries.push(self.entry(next.trivia, column)?);
        }
        Ok(Node::enclose(YamlKind::Mapping, entries)?)
    }

    fn entry(&mut self, prefix: String, column: usize) -> Result<Node<Yaml>> {
        let colon = self
            .key_colon(self.pos)
            .ok_or_else(|| self.error("expected a mapping key"))?;
        let key_len = self.line_at(self.pos)[..colon].trim_end().len();
        let mut children = vec![self.token(YamlKind::Key, prefix, key_len)];
        let ws = self.whitespace();
        children.push(self.token(YamlKind::Colon, ws, 1));

        let next = self.lookahead();
        if !next.at_end {
            if !next.newline {
                self.pos = next.pos;
                children.push(self.scalar(next.trivia, Some(column))?);
            } else if next.column > column
                || (next.column == column && self.is_dash(next.pos))
            {
                self.pos = next.pos;
                children.push(self.node(next.trivia, Some(column))?);
            }
        }
        Ok(Node::enclose(YamlKind::Entry, children)?)
    }

    fn sequence(&mut self, prefix: String, column: usize) -> Result<Node<Yaml>> {
        let mut items = vec![self.item(prefix, column)?];
        loop {
            let next = self.lookahead();
            if next.at_end || !next.newline || next.column != column || !self.is_dash(next.pos) {
                break;
            }
            self.pos = next.pos;
            items.push(self.item(next.trivia, column)?);
        }
        Ok(Node::enclose(YamlKind::Sequence, items)?)
    }

    fn item(&mut self, prefix: String, column: usize) -> Result<Node<Yaml>> {
        let mut children = vec![self.token(YamlKind::Dash, prefix, 1)];
        let next = self.lookahead();
        if !next.at_end && (!next.newline || next.column > column) {
            self.pos = next.pos;
            children.push(self.node(next.trivia, Some(column))?);
        }
        Ok(Node::enclose(YamlKind::SeqItem, children)?)
    }

    fn scalar(&mut self, prefix: String, parent: Option<usize>) -> Result<Node<Yaml>> {
        let line = self.line_at(self.pos);
        let len = match line.chars().next() {
            Some(q @ ('"' | '\'')) => {
                closing_quote(line, q).ok_or_else(|| self.error("unterminated quoted scalar"))? + 1
            }
            Some('|' | '>') => self.block_scalar_len(parent),
            _ => {
                let end = line.find(" #").or_else(|| line.find("\t#")).unwrap_or(line.len());
                line[..end].trim_end().len()
            }
        };
        Ok(self.token(YamlKind::Scalar, prefix, len))
    }

    /// Header line plus every following line indented deeper than `parent`
    fn block_scalar_len(&self, parent: Option<usize>) -> usize {
        let header = self.line_at(self.pos);
        let header_len = header.find(" #").unwrap_or(header.len());
        let mut end = self.pos + header.trim_end().len().min(header_len);
        let mut line_start = self.pos + header.len() + 1;
        while line_start <= self.src.len() {
            let line = self.line_at(line_start.min(self.src.len()));
            let indent = line.len() - line.trim_start_matches(' ').len();
            if self.is_doc_start(line_start.min(self.src.len())) {
                break;
            }
            if !line.trim().is_empty() {
                if parent.is_some_and(|p| indent <= p) {
                    break;
                }
                end = line_start + line.trim_end().len();
            }
            line_start += line.len() + 1;
        }
        end - self.pos
    }
}

/// Byte offset of the quote closing the scalar that opens `text`
fn closing_quote(text: &str, quote: char) -> Option<usize> {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if quote == '"' => {
                chars.next();
            }
            c if c == quote => {
                if quote == '\'' && chars.peek().is_some_and(|&(_, n)| n == '\'') {
                    chars.next();
                } else {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use remold_core::{ErrorKind, print};

    fn parse(text: &str) -> Result<Node<Yaml>> {
        YamlParser::new().parse_document(Path::new("t.yml"), text)
    }

    fn kinds(node: &Node<Yaml>) -> Vec<YamlKind> {
        node.descendants().filter(|n| !n.is_token()).map(|n| n.kind()).collect()
    }

    #[test]
    fn test_round_trip() {
        let inputs = [
            "",
            "a: 1",
            "# header\n---\na: 1 # trailing\nb:\n  c: 'x: y'\n  d: \"q \\\" z\"\n\n",
            "list:\n- a\n- b: 1\n  c: 2\n-\n  - nested\n",
            "text: |\n  line one\n    line two\n\nnext: >-\n  folded\n",
            "flow: [a, b]\nurl: http://example.com:8080/x\n",
        ];
        for input in inputs {
            assert_eq!(print(&parse(input).unwrap()), input, "{input:?}");
        }
    }

    #[test]
    fn test_structure() {
        let doc = parse("a:\n  b: 1\n  c:\n  - x\nd: 2\n").unwrap();
        use YamlKind::*;
        assert_eq!(
            kinds(&doc),
            vec![Document, Mapping, Entry, Mapping, Entry, Entry, Sequence, SeqItem, Entry]
        );
    }

    #[test]
    fn test_compact_mapping_in_sequence() {
        let doc = parse("- name: a\n  value: 1\n- name: b\n").unwrap();
        use YamlKind::*;
        assert_eq!(
            kinds(&doc),
            vec![Document, Sequence, SeqItem, Mapping, Entry, Entry, SeqItem, Mapping, Entry]
        );
    }

    #[test]
    fn test_block_scalar_is_one_token() {
        let doc = parse("text: |\n  one\n  two\nnext: 1").unwrap();
        let scalar = doc
            .descendants()
            .find(|n| n.kind() == YamlKind::Scalar)
            .unwrap();
        assert_eq!(scalar.text(), Some("|\n  one\n  two"));
    }

    #[test]
    fn test_document_markers_split_stream() {
        let inputs = [
            "a: 'x'\n---\nb: 1",
            "---\na: 1\n# second\n---\n- x\n---\n",
            "text: |\n  body\n---\nc: 2\n",
        ];
        for input in inputs {
            assert_eq!(print(&parse(input).unwrap()), input, "{input:?}");
        }

        let stream = parse("a: 'x'\n---\nb: 1").unwrap();
        assert_eq!(stream.kind(), YamlKind::Stream);
        use YamlKind::*;
        assert_eq!(
            kinds(&stream),
            vec![Stream, Document, Mapping, Entry, Document, Mapping, Entry]
        );
        let second = &stream.children()[1];
        assert_eq!(second.children()[0].kind(), DocStart);
        assert_eq!(second.children()[0].prefix(), "\n");

        assert_eq!(parse("---\na: 1\n").unwrap().kind(), Document);
    }

    #[test]
    fn test_bad_indentation_is_parse_error() {
        let err = parse("a: 1\n   b: 2\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(parse("a: 'open").is_err());
    }
}
