//! Java front-end
//!
//! [`JavaParser`] parses a batch of compilation units in parallel and then
//! attributes them together against one shared [`TypeCache`], so that a
//! field declared in one file types the accesses made from another.
//!
//! The syntax parser is recursive descent over the lexemes of one file. Local
//! variable declarations and expression statements share a prefix
//! (`a.b c;` against `a.b(c);`), so statements are tried as declarations
//! first and the parser backtracks when that fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use remold_core::{Formatting, Node, Parser, RemoldError, Result, SourceFile, TypeCache};
use tracing::debug;

use crate::attribute::attribute_batch;
use crate::lexer::{Class, Lexeme, tokenize};
use crate::syntax::{Java, JavaKind};

/// Parser and type attributor for Java-like sources
#[derive(Clone)]
pub struct JavaParser {
    cache: Arc<TypeCache>,
}

impl std::fmt::Debug for JavaParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaParser")
            .field("types", &self.cache.len())
            .finish()
    }
}

impl JavaParser {
    pub fn new(cache: Arc<TypeCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<TypeCache> {
        &self.cache
    }

    /// Parse one unit without attributing it
    pub fn parse_syntax(&self, path: &Path, text: &str) -> Result<Node<Java>> {
        Syntax {
            lexemes: tokenize(path, text)?,
            pos: 0,
            path: path.to_path_buf(),
        }
        .compilation_unit()
    }

    /// Parse and attribute sources given as text, naming each file after its
    /// package and first type
    pub fn parse(&self, sources: &[&str]) -> Result<Vec<SourceFile<Java>>> {
        let inputs: Vec<(PathBuf, String)> = sources
            .iter()
            .enumerate()
            .map(|(i, text)| (source_path(text, i), text.to_string()))
            .collect();
        self.parse_all(&inputs)
    }
}

impl Parser<Java> for JavaParser {
    fn parse_str(&self, path: &Path, text: &str) -> Result<SourceFile<Java>> {
        let mut parsed = self.parse_all(&[(path.to_path_buf(), text.to_string())])?;
        parsed
            .pop()
            .ok_or_else(|| RemoldError::parse_error(path, 0, "nothing was parsed"))
    }

    fn parse_all(&self, inputs: &[(PathBuf, String)]) -> Result<Vec<SourceFile<Java>>> {
        let started = Instant::now();
        let units = inputs
            .par_iter()
            .map(|(path, text)| Ok(SourceFile::new(path, self.parse_syntax(path, text)?)))
            .collect::<Result<Vec<_>>>()?;
        let attributed = attribute_batch(&self.cache, units)?;
        debug!(
            "Parsed and attributed {} Java sources in {:?} ({} types cached)",
            attributed.len(),
            started.elapsed(),
            self.cache.len()
        );
        Ok(attributed)
    }
}

/// `b/B.java` for a source declaring `package b;` and `class B`
fn source_path(text: &str, index: usize) -> PathBuf {
    let words: Vec<&str> = text
        .trim_start_matches('\u{feff}')
        .split(|c: char| c.is_whitespace() || matches!(c, ';' | '{' | '<'))
        .filter(|w| !w.is_empty())
        .collect();
    let after = |keyword: &str| {
        words
            .iter()
            .position(|w| *w == keyword)
            .and_then(|i| words.get(i + 1).copied())
    };
    let name = ["class", "interface"]
        .iter()
        .filter_map(|k| after(k))
        .next()
        .map_or_else(|| format!("Source{index}"), str::to_string);
    let mut path = PathBuf::new();
    if let Some(package) = after("package") {
        path.extend(package.split('.'));
    }
    path.push(format!("{name}.java"));
    path
}

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
    "transient",
    "volatile",
    "strictfp",
    "default",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", ">>>=",
];

fn binary_precedence(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | ">" | "<=" | ">=" => 7,
        "<<" | ">>" | ">>>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    })
}

struct Syntax<'s> {
    lexemes: Vec<Lexeme<'s>>,
    pos: usize,
    path: PathBuf,
}

impl<'s> Syntax<'s> {
    fn peek(&self) -> &Lexeme<'s> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &Lexeme<'s> {
        let index = (self.pos + ahead).min(self.lexemes.len() - 1);
        &self.lexemes[index]
    }

    fn at(&self, text: &str) -> bool {
        let lexeme = self.peek();
        lexeme.class != Class::Literal && lexeme.text == text
    }

    fn at_class(&self, class: Class) -> bool {
        self.peek().class == class
    }

    fn error(&self, message: impl Into<String>) -> RemoldError {
        RemoldError::parse_error(&self.path, self.peek().offset, message)
    }

    fn bump(&mut self, kind: JavaKind) -> Node<Java> {
        let lexeme = self.peek();
        let node = Node::token(kind, Formatting::new(lexeme.prefix), lexeme.text);
        if self.pos < self.lexemes.len() - 1 {
            self.pos += 1;
        }
        node
    }

    fn expect(&mut self, text: &str, kind: JavaKind) -> Result<Node<Java>> {
        if self.at(text) {
            Ok(self.bump(kind))
        } else {
            Err(self.error(format!("expected '{text}', found '{}'", self.peek().text)))
        }
    }

    fn ident(&mut self) -> Result<Node<Java>> {
        if self.at_class(Class::Ident) {
            Ok(self.bump(JavaKind::Ident))
        } else {
            Err(self.error(format!("expected an identifier, found '{}'", self.peek().text)))
        }
    }

    fn compilation_unit(&mut self) -> Result<Node<Java>> {
        let mut children = Vec::new();
        if self.at("package") {
            let keyword = self.bump(JavaKind::Keyword);
            let name = self.qualified_name(false)?;
            let semi = self.expect(";", JavaKind::Semi)?;
            children.push(Node::enclose(JavaKind::Package, vec![keyword, name, semi])?);
        }
        while self.at("import") {
            let mut parts = vec![self.bump(JavaKind::Keyword)];
            if self.at("static") {
                parts.push(self.bump(JavaKind::Keyword));
            }
            parts.push(self.qualified_name(true)?);
            parts.push(self.expect(";", JavaKind::Semi)?);
            children.push(Node::enclose(JavaKind::Import, parts)?);
        }
        while !self.at_class(Class::Eof) {
            if self.at(";") {
                let semi = self.bump(JavaKind::Semi);
                children.push(Node::enclose(JavaKind::Empty, vec![semi])?);
                continue;
            }
            let modifiers = self.modifiers()?;
            children.push(self.class_decl(modifiers)?);
        }
        // leading comments stay on the first declaration so that trimmed printing keeps them
        let trailing = self.peek().prefix;
        Ok(Node::branch(
            JavaKind::CompilationUnit,
            Formatting::EMPTY.with_suffix(trailing),
            children,
        )?)
    }

    /// `a.b.C`, optionally ending in `.*`
    fn qualified_name(&mut self, allow_star: bool) -> Result<Node<Java>> {
        let mut name = self.ident()?;
        while self.at(".") {
            let dot = self.bump(JavaKind::Dot);
            let segment = if allow_star && self.at("*") {
                self.bump(JavaKind::Ident)
            } else {
                self.ident()?
            };
            name = Node::enclose(JavaKind::FieldAccess, vec![name, dot, segment])?;
        }
        Ok(name)
    }

    fn modifiers(&mut self) -> Result<Option<Node<Java>>> {
        let mut keywords = Vec::new();
        while MODIFIERS.iter().any(|m| self.at(m)) && !(self.at("static") && self.peek_at(1).text == "{") {
            keywords.push(self.bump(JavaKind::Keyword));
        }
        if self.at("@") {
            return Err(self.error("annotations are not supported"));
        }
        if keywords.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Node::enclose(JavaKind::Modifiers, keywords)?))
        }
    }

    fn class_decl(&mut self, modifiers: Option<Node<Java>>) -> Result<Node<Java>> {
        if !(self.at("class") || self.at("interface")) {
            return Err(self.error(format!(
                "expected a class or interface declaration, found '{}'",
                self.peek().text
            )));
        }
        let mut children: Vec<Node<Java>> = modifiers.into_iter().collect();
        children.push(self.bump(JavaKind::Keyword));
        children.push(self.ident()?);
        if self.at("<") {
            children.push(self.type_params()?);
        }
        for clause in ["extends", "implements"] {
            if self.at(clause) {
                let kind = if clause == "extends" {
                    JavaKind::Extends
                } else {
                    JavaKind::Implements
                };
                children.push(self.type_list(kind)?);
            }
        }
        children.push(self.class_body()?);
        Ok(Node::enclose(JavaKind::ClassDecl, children)?)
    }

    fn type_params(&mut self) -> Result<Node<Java>> {
        let mut children = vec![self.expect("<", JavaKind::Lt)?];
        children.push(self.ident()?);
        while self.at(",") {
            children.push(self.bump(JavaKind::Comma));
            children.push(self.ident()?);
        }
        children.push(self.expect(">", JavaKind::Gt)?);
        Ok(Node::enclose(JavaKind::TypeParams, children)?)
    }

    /// `extends A, B`, `implements A` or `throws A, B`
    fn type_list(&mut self, kind: JavaKind) -> Result<Node<Java>> {
        let mut children = vec![self.bump(JavaKind::Keyword), self.type_expr()?];
        while self.at(",") {
            children.push(self.bump(JavaKind::Comma));
            children.push(self.type_expr()?);
        }
        Ok(Node::enclose(kind, children)?)
    }

    fn class_body(&mut self) -> Result<Node<Java>> {
        let mut children = vec![self.expect("{", JavaKind::LBrace)?];
        while !self.at("}") {
            if self.at_class(Class::Eof) {
                return Err(self.error("unterminated class body"));
            }
            children.push(self.member()?);
        }
        children.push(self.bump(JavaKind::RBrace));
        Ok(Node::enclose(JavaKind::ClassBody, children)?)
    }

    fn member(&mut self) -> Result<Node<Java>> {
        if self.at(";") {
            let semi = self.bump(JavaKind::Semi);
            return Ok(Node::enclose(JavaKind::Empty, vec![semi])?);
        }
        if self.at("{") || (self.at("static") && self.peek_at(1).text == "{") {
            return self.block();
        }
        let modifiers = self.modifiers()?;
        if self.at("class") || self.at("interface") {
            return self.class_decl(modifiers);
        }
        let type_params = if self.at("<") {
            Some(self.type_params()?)
        } else {
            None
        };
        // constructor
        if self.at_class(Class::Ident) && self.peek_at(1).text == "(" {
            let name = self.ident()?;
            return self.method_decl(modifiers, type_params, None, name);
        }
        let ty = self.type_expr()?;
        let name = self.ident()?;
        if self.at("(") {
            return self.method_decl(modifiers, type_params, Some(ty), name);
        }
        if type_params.is_some() {
            return Err(self.error("type parameters on a field"));
        }
        self.var_decls(modifiers, ty, name, true)
    }

    fn method_decl(
        &mut self,
        modifiers: Option<Node<Java>>,
        type_params: Option<Node<Java>>,
        return_type: Option<Node<Java>>,
        name: Node<Java>,
    ) -> Result<Node<Java>> {
        let mut children: Vec<Node<Java>> = modifiers
            .into_iter()
            .chain(type_params)
            .chain(return_type)
            .collect();
        children.push(name);
        children.push(self.params()?);
        if self.at("throws") {
            children.push(self.type_list(JavaKind::Throws)?);
        }
        if self.at(";") {
            children.push(self.bump(JavaKind::Semi));
        } else {
            children.push(self.block()?);
        }
        Ok(Node::enclose(JavaKind::MethodDecl, children)?)
    }

    fn params(&mut self) -> Result<Node<Java>> {
        let mut children = vec![self.expect("(", JavaKind::LParen)?];
        if !self.at(")") {
            loop {
                let modifiers = self.modifiers()?;
                let ty = self.type_expr()?;
                let name = self.ident()?;
                let var = Node::enclose(JavaKind::NamedVar, vec![name])?;
                let mut decl: Vec<Node<Java>> = modifiers.into_iter().collect();
                decl.push(ty);
                decl.push(var);
                children.push(Node::enclose(JavaKind::VariableDecls, decl)?);
                if !self.at(",") {
                    break;
                }
                children.push(self.bump(JavaKind::Comma));
            }
        }
        children.push(self.expect(")", JavaKind::RParen)?);
        Ok(Node::enclose(JavaKind::Params, children)?)
    }

    /// Variables after their type and first name, through the closing `;`
    fn var_decls(
        &mut self,
        modifiers: Option<Node<Java>>,
        ty: Node<Java>,
        first: Node<Java>,
        semicolon: bool,
    ) -> Result<Node<Java>> {
        let mut children: Vec<Node<Java>> = modifiers.into_iter().collect();
        children.push(ty);
        children.push(self.named_var(first)?);
        while self.at(",") {
            children.push(self.bump(JavaKind::Comma));
            let name = self.ident()?;
            children.push(self.named_var(name)?);
        }
        if semicolon {
            children.push(self.expect(";", JavaKind::Semi)?);
        }
        Ok(Node::enclose(JavaKind::VariableDecls, children)?)
    }

    fn named_var(&mut self, name: Node<Java>) -> Result<Node<Java>> {
        let mut children = vec![name];
        if self.at("[") {
            return Err(self.error("array dimensions belong on the type"));
        }
        if self.at("=") {
            children.push(self.bump(JavaKind::Operator));
            children.push(self.expression()?);
        }
        Ok(Node::enclose(JavaKind::NamedVar, children)?)
    }

    fn type_expr(&mut self) -> Result<Node<Java>> {
        let mut ty = if PRIMITIVES.iter().any(|p| self.at(p)) {
            self.bump(JavaKind::Keyword)
        } else {
            let name = self.qualified_name(false)?;
            if self.at("<") {
                let args = self.type_args()?;
                Node::enclose(JavaKind::ParameterizedType, vec![name, args])?
            } else {
                name
            }
        };
        while self.at("[") && self.peek_at(1).text == "]" {
            let open = self.bump(JavaKind::LBracket);
            let close = self.bump(JavaKind::RBracket);
            ty = Node::enclose(JavaKind::ArrayType, vec![ty, open, close])?;
        }
        Ok(ty)
    }

    fn type_args(&mut self) -> Result<Node<Java>> {
        let mut children = vec![self.expect("<", JavaKind::Lt)?];
        if !self.at(">") {
            children.push(self.type_expr()?);
            while self.at(",") {
                children.push(self.bump(JavaKind::Comma));
                children.push(self.type_expr()?);
            }
        }
        children.push(self.expect(">", JavaKind::Gt)?);
        Ok(Node::enclose(JavaKind::TypeArgs, children)?)
    }

    fn block(&mut self) -> Result<Node<Java>> {
        let mut children = Vec::new();
        if self.at("static") {
            children.push(self.bump(JavaKind::Keyword));
        }
        children.push(self.expect("{", JavaKind::LBrace)?);
        while !self.at("}") {
            if self.at_class(Class::Eof) {
                return Err(self.error("unterminated block"));
            }
            children.push(self.statement()?);
        }
        children.push(self.bump(JavaKind::RBrace));
        Ok(Node::enclose(JavaKind::Block, children)?)
    }

    fn statement(&mut self) -> Result<Node<Java>> {
        if self.at("{") {
            return self.block();
        }
        if self.at(";") {
            let semi = self.bump(JavaKind::Semi);
            return Ok(Node::enclose(JavaKind::Empty, vec![semi])?);
        }
        if self.at("if") {
            let mut children = vec![self.bump(JavaKind::Keyword), self.parens()?, self.statement()?];
            if self.at("else") {
                let keyword = self.bump(JavaKind::Keyword);
                let body = self.statement()?;
                children.push(Node::enclose(JavaKind::Else, vec![keyword, body])?);
            }
            return Ok(Node::enclose(JavaKind::If, children)?);
        }
        if self.at("while") {
            let children = vec![self.bump(JavaKind::Keyword), self.parens()?, self.statement()?];
            return Ok(Node::enclose(JavaKind::While, children)?);
        }
        if self.at("return") {
            let mut children = vec![self.bump(JavaKind::Keyword)];
            if !self.at(";") {
                children.push(self.expression()?);
            }
            children.push(self.expect(";", JavaKind::Semi)?);
            return Ok(Node::enclose(JavaKind::Return, children)?);
        }
        if self.at("class") || self.at("interface") {
            return self.class_decl(None);
        }
        if let Some(decl) = self.try_local_var_decls()? {
            return Ok(decl);
        }
        let expression = self.expression()?;
        let semi = self.expect(";", JavaKind::Semi)?;
        Ok(Node::enclose(JavaKind::ExprStatement, vec![expression, semi])?)
    }

    /// A local declaration, or `None` with the position restored
    fn try_local_var_decls(&mut self) -> Result<Option<Node<Java>>> {
        let start = self.pos;
        let modifiers = self.modifiers()?;
        let declaration = match self.type_expr() {
            Ok(ty) if self.at_class(Class::Ident)
                && matches!(self.peek_at(1).text, "=" | ";" | "," | "[") =>
            {
                Some(ty)
            }
            _ => None,
        };
        match declaration {
            Some(ty) => {
                let name = self.ident()?;
                Ok(Some(self.var_decls(modifiers, ty, name, true)?))
            }
            None => {
                self.pos = start;
                Ok(None)
            }
        }
    }

    fn parens(&mut self) -> Result<Node<Java>> {
        let open = self.expect("(", JavaKind::LParen)?;
        let inner = self.expression()?;
        let close = self.expect(")", JavaKind::RParen)?;
        Ok(Node::enclose(JavaKind::Parens, vec![open, inner, close])?)
    }

    fn expression(&mut self) -> Result<Node<Java>> {
        let target = self.binary(1)?;
        let Some(op) = self.assign_op() else {
            return Ok(target);
        };
        let kind = if op.text() == Some("=") {
            JavaKind::Assign
        } else {
            JavaKind::AssignOp
        };
        let value = self.expression()?;
        Ok(Node::enclose(kind, vec![target, op, value])?)
    }

    /// The operator at the current position, merging adjacent `>` lexemes
    /// into shift operators
    fn operator_text(&self) -> (String, usize) {
        let mut text = self.peek().text.to_string();
        let mut count = 1;
        if self.peek().class != Class::Punct {
            return (text, count);
        }
        if text == ">" {
            while count < 3 {
                let next = self.peek_at(count);
                if !next.prefix.is_empty() || !matches!(next.text, ">" | ">=") {
                    break;
                }
                text.push_str(next.text);
                count += 1;
                if next.text == ">=" {
                    break;
                }
            }
        }
        (text, count)
    }

    fn take_operator(&mut self, text: String, count: usize) -> Node<Java> {
        let prefix = self.peek().prefix;
        let node = Node::token(JavaKind::Operator, Formatting::new(prefix), text);
        self.pos = (self.pos + count).min(self.lexemes.len() - 1);
        node
    }

    fn assign_op(&mut self) -> Option<Node<Java>> {
        let (text, count) = self.operator_text();
        if self.peek().class == Class::Punct && ASSIGN_OPS.contains(&text.as_str()) {
            Some(self.take_operator(text, count))
        } else {
            None
        }
    }

    fn binary(&mut self, min: u8) -> Result<Node<Java>> {
        let mut left = self.unary()?;
        loop {
            let (text, count) = self.operator_text();
            let Some(precedence) = binary_precedence(&text).filter(|p| *p >= min) else {
                break;
            };
            if self.peek().class != Class::Punct {
                break;
            }
            let op = self.take_operator(text, count);
            let right = self.binary(precedence + 1)?;
            left = Node::enclose(JavaKind::Binary, vec![left, op, right])?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Node<Java>> {
        if ["+", "-", "!", "~", "++", "--"].iter().any(|op| self.at(op)) {
            let op = self.bump(JavaKind::Operator);
            let operand = self.unary()?;
            return Ok(Node::enclose(JavaKind::Prefix, vec![op, operand])?);
        }
        let mut operand = self.postfix_chain()?;
        while self.at("++") || self.at("--") {
            let op = self.bump(JavaKind::Operator);
            operand = Node::enclose(JavaKind::Postfix, vec![operand, op])?;
        }
        Ok(operand)
    }

    fn postfix_chain(&mut self) -> Result<Node<Java>> {
        let mut node = self.primary()?;
        loop {
            if self.at("(") && node.kind().is_name() {
                let args = self.args()?;
                node = Node::enclose(JavaKind::MethodInvocation, vec![node, args])?;
            } else if self.at(".") {
                let dot = self.bump(JavaKind::Dot);
                let name = self.ident()?;
                node = Node::enclose(JavaKind::FieldAccess, vec![node, dot, name])?;
            } else if self.at("[") {
                let open = self.bump(JavaKind::LBracket);
                let index = self.expression()?;
                let close = self.expect("]", JavaKind::RBracket)?;
                node = Node::enclose(JavaKind::ArrayAccess, vec![node, open, index, close])?;
            } else {
                return Ok(node);
            }
        }
    }

    fn primary(&mut self) -> Result<Node<Java>> {
        match self.peek().class {
            Class::Literal => Ok(self.bump(JavaKind::Literal)),
            Class::Ident => Ok(self.bump(JavaKind::Ident)),
            Class::Keyword if self.at("this") || self.at("super") => Ok(self.bump(JavaKind::Keyword)),
            Class::Keyword if self.at("new") => {
                let mut children = vec![self.bump(JavaKind::Keyword)];
                let name = self.qualified_name(false)?;
                children.push(if self.at("<") {
                    let args = self.type_args()?;
                    Node::enclose(JavaKind::ParameterizedType, vec![name, args])?
                } else {
                    name
                });
                children.push(self.args()?);
                if self.at("{") {
                    children.push(self.class_body()?);
                }
                Ok(Node::enclose(JavaKind::NewClass, children)?)
            }
            _ if self.at("(") => self.parens(),
            _ => Err(self.error(format!("expected an expression, found '{}'", self.peek().text))),
        }
    }

    fn args(&mut self) -> Result<Node<Java>> {
        let mut children = vec![self.expect("(", JavaKind::LParen)?];
        if !self.at(")") {
            children.push(self.expression()?);
            while self.at(",") {
                children.push(self.bump(JavaKind::Comma));
                children.push(self.expression()?);
            }
        }
        children.push(self.expect(")", JavaKind::RParen)?);
        Ok(Node::enclose(JavaKind::Args, children)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remold_core::{ErrorKind, print};

    fn parse(text: &str) -> Node<Java> {
        JavaParser::new(Arc::new(TypeCache::new()))
            .parse_syntax(Path::new("A.java"), text)
            .unwrap()
    }

    fn kinds(node: &Node<Java>) -> Vec<JavaKind> {
        node.descendants()
            .filter(|n| !n.is_token())
            .map(|n| n.kind())
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let sources = [
            "",
            "// header\npackage a.b;\n\nimport java.util.*;\nimport static a.B.c;\n\npublic class A<T> extends B implements C, D {\n}\n",
            "class A {\n    int n = 0, m;\n    static { n = 1; }\n    A(int n) { this.n = n; }\n    void f(final String[] a) throws E {\n        if (a.length > 0) f(a); else { return; }\n        while (n-- > 0) ;\n    }\n}",
            "class A { void f() { x = a >> 2 >>> b; y += (z) * -w[i]; List<Map<K, V>> l = new ArrayList<>(); } }",
            "interface I { int f(); }",
            "\u{feff}package a;\n\nclass A {}\n",
            "\u{feff}",
        ];
        for source in sources {
            assert_eq!(print(&parse(source)), source);
        }
    }

    #[test]
    fn test_local_declaration_against_expression() {
        use JavaKind::*;
        let unit = parse("class A { void f() { a.b c; a.b(c); a < b; List<A> l; } }");
        let body = unit
            .descendants()
            .filter(|n| n.kind() == Block)
            .last()
            .unwrap();
        let statements: Vec<JavaKind> = body
            .children()
            .iter()
            .filter(|c| c.kind().is_statement())
            .map(|c| c.kind())
            .collect();
        assert_eq!(statements, vec![VariableDecls, ExprStatement, ExprStatement, VariableDecls]);
    }

    #[test]
    fn test_precedence() {
        let unit = parse("class A { { x = a + b * c == d; } }");
        let assign = unit
            .descendants()
            .find(|n| n.kind() == JavaKind::Assign)
            .unwrap();
        use JavaKind::*;
        assert_eq!(kinds(assign), vec![Assign, Binary, Binary, Binary]);
        let equality = &assign.children()[2];
        assert_eq!(equality.children()[1].text(), Some("=="));
    }

    #[test]
    fn test_source_paths() {
        assert_eq!(source_path("package b;\ninterface B {}", 0), PathBuf::from("b/B.java"));
        assert_eq!(source_path("public class A<T> {}", 0), PathBuf::from("A.java"));
        assert_eq!(source_path("", 3), PathBuf::from("Source3.java"));
        assert_eq!(source_path("\u{feff}package c;\nclass C {}", 0), PathBuf::from("c/C.java"));
    }

    #[test]
    fn test_errors() {
        let parser = JavaParser::new(Arc::new(TypeCache::new()));
        let err = parser
            .parse_syntax(Path::new("A.java"), "class A { void f() { x = ; } }")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(parser.parse_syntax(Path::new("A.java"), "class A {").is_err());
        assert!(parser.parse_syntax(Path::new("A.java"), "enum E { A }").is_err());
    }
}
