//! Java tokenizer
//!
//! Splits source text into lexemes, each carrying the whitespace and
//! comments before it. The final [`Class::Eof`] lexeme holds the trailing
//! trivia of the file.

use std::path::Path;

use remold_core::{RemoldError, Result};

/// Coarse lexical class; the parser decides the node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Class {
    Ident,
    Keyword,
    Literal,
    Punct,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme<'s> {
    pub class: Class,
    pub prefix: &'s str,
    pub text: &'s str,
    pub offset: usize,
}

const KEYWORDS: &[&str] = &[
    "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "continue",
    "default", "do", "double", "else", "enum", "extends", "final", "finally", "float", "for",
    "if", "implements", "import", "instanceof", "int", "interface", "long", "native", "new",
    "package", "private", "protected", "public", "return", "short", "static", "strictfp",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
    "volatile", "while",
];

/// Longest operators first so that the first match wins
const OPERATORS: &[&str] = &[
    "<<=", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", "->", "::", "+", "-", "*", "/", "%", "=", "<", ">", "!", "~", "?", ":",
    "&", "|", "^", ".", ",", ";", "(", ")", "{", "}", "[", "]", "@",
];

pub(crate) fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub(crate) fn tokenize<'s>(path: &Path, src: &'s str) -> Result<Vec<Lexeme<'s>>> {
    let mut lexemes = Vec::new();
    let mut pos = 0;
    loop {
        let start = pos;
        pos = skip_trivia(path, src, pos)?;
        let prefix = &src[start..pos];
        let rest = &src[pos..];
        let Some(c) = rest.chars().next() else {
            lexemes.push(Lexeme {
                class: Class::Eof,
                prefix,
                text: "",
                offset: pos,
            });
            return Ok(lexemes);
        };

        let (class, len) = if c.is_alphabetic() || c == '_' || c == '$' {
            let len = rest
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '$'))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            let class = match word {
                "true" | "false" | "null" => Class::Literal,
                w if is_keyword(w) => Class::Keyword,
                _ => Class::Ident,
            };
            (class, len)
        } else if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit())) {
            (Class::Literal, number_len(rest))
        } else if c == '"' || c == '\'' {
            let len = quoted_len(rest, c)
                .ok_or_else(|| RemoldError::parse_error(path, pos, "unterminated literal"))?;
            (Class::Literal, len)
        } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            (Class::Punct, op.len())
        } else {
            return Err(RemoldError::parse_error(
                path,
                pos,
                format!("unexpected character '{c}'"),
            ));
        };
        lexemes.push(Lexeme {
            class,
            prefix,
            text: &rest[..len],
            offset: pos,
        });
        pos += len;
    }
}

const BYTE_ORDER_MARK: char = '\u{feff}';

fn skip_trivia(path: &Path, src: &str, mut pos: usize) -> Result<usize> {
    if pos == 0 && src.starts_with(BYTE_ORDER_MARK) {
        pos = BYTE_ORDER_MARK.len_utf8();
    }
    loop {
        let rest = &src[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if trimmed.starts_with("//") {
            pos += trimmed.find('\n').unwrap_or(trimmed.len());
        } else if trimmed.starts_with("/*") {
            let end = trimmed[2..]
                .find("*/")
                .ok_or_else(|| RemoldError::parse_error(path, pos, "unterminated comment"))?;
            pos += end + 4;
        } else {
            return Ok(pos);
        }
    }
}

fn number_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    if text.starts_with("0x") || text.starts_with("0X") {
        i = 2;
        while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
            i += 1;
        }
    } else {
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_' || bytes[i] == b'.') {
            // `1.foo()` is not a decimal point
            if bytes[i] == b'.' && !bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                break;
            }
            i += 1;
        }
        if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
            let sign = usize::from(matches!(bytes.get(i + 1), Some(b'+' | b'-')));
            if bytes.get(i + 1 + sign).is_some_and(u8::is_ascii_digit) {
                i += 1 + sign;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
        }
    }
    if i < bytes.len() && matches!(bytes[i], b'l' | b'L' | b'f' | b'F' | b'd' | b'D') {
        i += 1;
    }
    i
}

fn quoted_len(text: &str, quote: char) -> Option<usize> {
    let mut chars = text.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\n' => return None,
            c if c == quote => return Some(i + 1),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<(Class, &str)> {
        tokenize(Path::new("A.java"), src)
            .unwrap()
            .into_iter()
            .map(|l| (l.class, l.text))
            .collect()
    }

    #[test]
    fn test_classes() {
        assert_eq!(
            lex("int n = 0x1F + 2.5e3L;"),
            vec![
                (Class::Keyword, "int"),
                (Class::Ident, "n"),
                (Class::Punct, "="),
                (Class::Literal, "0x1F"),
                (Class::Punct, "+"),
                (Class::Literal, "2.5e3L"),
                (Class::Punct, ";"),
                (Class::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_trivia_becomes_prefix() {
        let lexemes = tokenize(Path::new("A.java"), "/* a */ x // b\n  y\n").unwrap();
        let prefixes: Vec<&str> = lexemes.iter().map(|l| l.prefix).collect();
        assert_eq!(prefixes, vec!["/* a */ ", " // b\n  ", "\n"]);
    }

    #[test]
    fn test_byte_order_mark_is_trivia() {
        let lexemes = tokenize(Path::new("A.java"), "\u{feff}// header\nclass A {}").unwrap();
        assert_eq!(lexemes[0].prefix, "\u{feff}// header\n");
        assert_eq!(lexemes[0].text, "class");
        assert!(tokenize(Path::new("A.java"), "class \u{feff}A {}").is_err());
    }

    #[test]
    fn test_shift_is_left_to_the_parser() {
        let texts: Vec<&str> = lex("a >> b >= c").into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["a", ">", ">", "b", ">=", "c", ""]);
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(lex(r#""a \" b" '\''"#)[..2], [(Class::Literal, r#""a \" b""#), (Class::Literal, r"'\''")]);
        assert!(tokenize(Path::new("A.java"), "\"open").is_err());
    }
}
