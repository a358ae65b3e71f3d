//! Remold XML
//!
//! A lossless XML front-end. Markup, attribute quoting, whitespace and
//! comments all survive a parse/print round trip; comments and inter-tag
//! whitespace are kept as node prefixes.
//!
//! [`Tag`] is a read-only view over element nodes, and [`with_value`]
//! rewrites an element's text content in place.

mod parser;
mod syntax;
mod tag;

pub use parser::XmlParser;
pub use syntax::{Xml, XmlKind};
pub use tag::{Tag, decode, encode, root_tag, with_value};

/// A node of an XML tree
pub type XmlNode = remold_core::Node<Xml>;
