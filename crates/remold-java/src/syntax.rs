use remold_core::{Language, Node, Shape, StructureError};

/// Node kinds of a Java tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaKind {
    // declarations
    CompilationUnit,
    Package,
    Import,
    ClassDecl,
    Modifiers,
    TypeParams,
    Extends,
    Implements,
    ClassBody,
    MethodDecl,
    Params,
    Throws,
    /// Type followed by one or more variables; fields, locals and parameters
    VariableDecls,
    /// One declared variable with its optional initializer
    NamedVar,

    // statements
    Block,
    ExprStatement,
    If,
    Else,
    While,
    Return,
    Empty,

    // expressions
    Parens,
    FieldAccess,
    MethodInvocation,
    Args,
    NewClass,
    Assign,
    AssignOp,
    Binary,
    Prefix,
    Postfix,
    ArrayAccess,

    // types
    ParameterizedType,
    TypeArgs,
    ArrayType,

    // tokens
    Ident,
    Keyword,
    /// Number, string, character, boolean or `null` literal
    Literal,
    /// Operator, including `=` and compound assignment
    Operator,
    Dot,
    Comma,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    /// `<` opening type arguments or parameters
    Lt,
    /// `>` closing type arguments or parameters
    Gt,
}

impl JavaKind {
    pub fn is_expression(self) -> bool {
        use JavaKind::*;
        matches!(
            self,
            Ident
                | Keyword
                | Literal
                | Parens
                | FieldAccess
                | MethodInvocation
                | NewClass
                | Assign
                | AssignOp
                | Binary
                | Prefix
                | Postfix
                | ArrayAccess
        )
    }

    pub fn is_type(self) -> bool {
        use JavaKind::*;
        matches!(self, Ident | Keyword | FieldAccess | ParameterizedType | ArrayType)
    }

    pub fn is_name(self) -> bool {
        matches!(self, JavaKind::Ident | JavaKind::FieldAccess)
    }

    pub fn is_statement(self) -> bool {
        use JavaKind::*;
        matches!(
            self,
            Block | VariableDecls | ExprStatement | If | While | Return | Empty | ClassDecl
        )
    }

    pub fn is_member(self) -> bool {
        use JavaKind::*;
        matches!(self, VariableDecls | MethodDecl | ClassDecl | Block | Empty)
    }

    pub fn is_token(self) -> bool {
        use JavaKind::*;
        matches!(
            self,
            Ident
                | Keyword
                | Literal
                | Operator
                | Dot
                | Comma
                | Semi
                | LParen
                | RParen
                | LBrace
                | RBrace
                | LBracket
                | RBracket
                | Lt
                | Gt
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Java;

impl Language for Java {
    type Kind = JavaKind;

    fn check(kind: JavaKind, children: &[Node<Self>]) -> Result<(), StructureError> {
        use JavaKind::*;
        let shape = Shape::of(kind, children);
        match kind {
            CompilationUnit => shape
                .opt_token(Package)
                .many(|k| k == Import)
                .many(|k| k == ClassDecl || k == Empty)
                .end(),
            Package => shape
                .token(Keyword)?
                .one("name", JavaKind::is_name)?
                .token(Semi)?
                .end(),
            Import => shape
                .token(Keyword)?
                .opt_token(Keyword)
                .one("name", JavaKind::is_name)?
                .token(Semi)?
                .end(),
            ClassDecl => shape
                .opt_token(Modifiers)
                .token(Keyword)?
                .token(Ident)?
                .opt_token(TypeParams)
                .opt_token(Extends)
                .opt_token(Implements)
                .token(ClassBody)?
                .end(),
            Modifiers => shape.token(Keyword)?.many(|k| k == Keyword).end(),
            TypeParams => shape
                .token(Lt)?
                .one("type parameter", |k| k == Ident)?
                .many(|k| k == Comma || k == Ident)
                .token(Gt)?
                .end(),
            Extends | Implements | Throws => shape
                .token(Keyword)?
                .one("type", JavaKind::is_type)?
                .many(|k| k == Comma || k.is_type())
                .end(),
            ClassBody => shape
                .token(LBrace)?
                .many(JavaKind::is_member)
                .token(RBrace)?
                .end(),
            MethodDecl => {
                // a constructor has no return type: its name comes right before the parameters
                let lead = children
                    .iter()
                    .take_while(|c| matches!(c.kind(), Modifiers | TypeParams))
                    .count();
                let constructor = children.get(lead + 1).is_some_and(|c| c.kind() == Params);
                let shape = shape.opt_token(Modifiers).opt_token(TypeParams);
                let shape = if constructor {
                    shape
                } else {
                    shape.one("return type", JavaKind::is_type)?
                };
                shape
                    .token(Ident)?
                    .token(Params)?
                    .opt_token(Throws)
                    .one("body", |k| k == Block || k == Semi)?
                    .end()
            }
            Params => shape
                .token(LParen)?
                .separated("parameter", |k| k == VariableDecls, Comma)?
                .token(RParen)?
                .end(),
            VariableDecls => shape
                .opt_token(Modifiers)
                .one("type", JavaKind::is_type)?
                .token(NamedVar)?
                .many(|k| k == Comma || k == NamedVar)
                .opt_token(Semi)
                .end(),
            NamedVar => shape
                .token(Ident)?
                .opt_token(Operator)
                .opt(JavaKind::is_expression)
                .end(),
            Block => shape
                .opt_token(Keyword)
                .token(LBrace)?
                .many(JavaKind::is_statement)
                .token(RBrace)?
                .end(),
            ExprStatement => shape
                .one("expression", JavaKind::is_expression)?
                .token(Semi)?
                .end(),
            If => shape
                .token(Keyword)?
                .token(Parens)?
                .one("statement", JavaKind::is_statement)?
                .opt_token(Else)
                .end(),
            Else => shape
                .token(Keyword)?
                .one("statement", JavaKind::is_statement)?
                .end(),
            While => shape
                .token(Keyword)?
                .token(Parens)?
                .one("statement", JavaKind::is_statement)?
                .end(),
            Return => shape
                .token(Keyword)?
                .opt(JavaKind::is_expression)
                .token(Semi)?
                .end(),
            Empty => shape.token(Semi)?.end(),
            Parens => shape
                .token(LParen)?
                .one("expression", JavaKind::is_expression)?
                .token(RParen)?
                .end(),
            FieldAccess => shape
                .one("target", |k| k.is_expression() || k.is_type())?
                .token(Dot)?
                .token(Ident)?
                .end(),
            MethodInvocation => shape
                .one("method name", JavaKind::is_name)?
                .token(Args)?
                .end(),
            Args => shape
                .token(LParen)?
                .separated("argument", JavaKind::is_expression, Comma)?
                .token(RParen)?
                .end(),
            NewClass => shape
                .token(Keyword)?
                .one("type", JavaKind::is_type)?
                .token(Args)?
                .opt_token(ClassBody)
                .end(),
            Assign | AssignOp | Binary => shape
                .one("operand", JavaKind::is_expression)?
                .token(Operator)?
                .one("operand", JavaKind::is_expression)?
                .end(),
            Prefix => shape
                .token(Operator)?
                .one("operand", JavaKind::is_expression)?
                .end(),
            Postfix => shape
                .one("operand", JavaKind::is_expression)?
                .token(Operator)?
                .end(),
            ArrayAccess => shape
                .one("array", JavaKind::is_expression)?
                .token(LBracket)?
                .one("index", JavaKind::is_expression)?
                .token(RBracket)?
                .end(),
            ParameterizedType => shape
                .one("type", JavaKind::is_name)?
                .token(TypeArgs)?
                .end(),
            TypeArgs => shape
                .token(Lt)?
                .separated("type argument", JavaKind::is_type, Comma)?
                .token(Gt)?
                .end(),
            ArrayType => shape
                .one("element type", JavaKind::is_type)?
                .token(LBracket)?
                .token(RBracket)?
                .end(),
            Ident | Keyword | Literal | Operator | Dot | Comma | Semi | LParen | RParen
            | LBrace | RBrace | LBracket | RBracket | Lt | Gt => shape.end(),
        }
    }
}
