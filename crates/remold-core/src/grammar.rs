//! Grammar-slot validation
//!
//! [`Shape`] walks the children of a branch left to right, consuming the
//! slots a grammar rule describes. Front-ends use it from
//! [`Language::check`](crate::tree::Language::check):
//!
//! ```ignore
//! Shape::of(kind, children)
//!     .token(Kind::If)?
//!     .one("condition", is_parens)?
//!     .one("statement", is_statement)?
//!     .opt(|k| k == Kind::Else)
//!     .end()
//! ```

use crate::error::StructureError;
use crate::tree::{Language, Node};

/// Cursor over the children of a branch being validated
pub struct Shape<'a, L: Language> {
    kind: L::Kind,
    children: &'a [Node<L>],
    pos: usize,
}

impl<'a, L: Language> Shape<'a, L> {
    pub fn of(kind: L::Kind, children: &'a [Node<L>]) -> Self {
        Self {
            kind,
            children,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<L::Kind> {
        self.children.get(self.pos).map(Node::kind)
    }

    fn fail(&self, expected: &str) -> StructureError {
        let found = match self.peek() {
            Some(kind) => format!("{kind:?}"),
            None => "nothing".to_string(),
        };
        StructureError::new(format!("{:?}", self.kind), self.pos, expected, found)
    }

    /// Exactly one child satisfying `accepts`
    pub fn one(
        mut self,
        expected: &str,
        accepts: impl Fn(L::Kind) -> bool,
    ) -> Result<Self, StructureError> {
        match self.peek() {
            Some(kind) if accepts(kind) => {
                self.pos += 1;
                Ok(self)
            }
            _ => Err(self.fail(expected)),
        }
    }

    /// Exactly one child of the given kind
    pub fn token(self, kind: L::Kind) -> Result<Self, StructureError> {
        let expected = format!("{kind:?}");
        self.one(&expected, |k| k == kind)
    }

    /// At most one child satisfying `accepts`
    pub fn opt(mut self, accepts: impl Fn(L::Kind) -> bool) -> Self {
        if self.peek().is_some_and(&accepts) {
            self.pos += 1;
        }
        self
    }

    pub fn opt_token(self, kind: L::Kind) -> Self {
        self.opt(|k| k == kind)
    }

    /// Any number of children satisfying `accepts`
    pub fn many(mut self, accepts: impl Fn(L::Kind) -> bool) -> Self {
        while self.peek().is_some_and(&accepts) {
            self.pos += 1;
        }
        self
    }

    /// Zero or more items separated by `separator`, no trailing separator
    pub fn separated(
        mut self,
        expected: &str,
        accepts: impl Fn(L::Kind) -> bool,
        separator: L::Kind,
    ) -> Result<Self, StructureError> {
        if !self.peek().is_some_and(&accepts) {
            return Ok(self);
        }
        self.pos += 1;
        while self.peek() == Some(separator) {
            self.pos += 1;
            self = self.one(expected, &accepts)?;
        }
        Ok(self)
    }

    /// No children may remain
    pub fn end(self) -> Result<(), StructureError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.fail("end of node")),
        }
    }
}
