use remold_core::{Language, Node, Shape, StructureError};

/// Node kinds of an XML tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlKind {
    // branches
    Document,
    Tag,
    Attribute,

    // tokens
    /// `<?xml ...?>`
    Prolog,
    /// `<`
    Lt,
    /// `</`
    LtSlash,
    /// `>`
    Gt,
    /// `/>`
    SlashGt,
    Name,
    AttrName,
    Eq,
    /// Quoted attribute value, quotes included
    AttrValue,
    /// Text content, entity references left encoded
    CharData,
    /// `<![CDATA[...]]>`
    CData,
}

impl XmlKind {
    pub fn is_content(self) -> bool {
        matches!(self, XmlKind::Tag | XmlKind::CharData | XmlKind::CData)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Xml;

impl Language for Xml {
    type Kind = XmlKind;

    fn check(kind: XmlKind, children: &[Node<Self>]) -> Result<(), StructureError> {
        use XmlKind::*;
        match kind {
            Document => Shape::of(kind, children)
                .opt_token(Prolog)
                .token(Tag)?
                .end(),
            Tag => {
                let head = Shape::of(kind, children)
                    .token(Lt)?
                    .token(Name)?
                    .many(|k| k == Attribute);
                if children.last().is_some_and(|c| c.kind() == SlashGt) {
                    head.token(SlashGt)?.end()
                } else {
                    head.token(Gt)?
                        .many(XmlKind::is_content)
                        .token(LtSlash)?
                        .token(Name)?
                        .token(Gt)?
                        .end()
                }
            }
            Attribute => Shape::of(kind, children)
                .token(AttrName)?
                .token(Eq)?
                .token(AttrValue)?
                .end(),
            Prolog | Lt | LtSlash | Gt | SlashGt | Name | AttrName | Eq | AttrValue | CharData
            | CData => Shape::of(kind, children).end(),
        }
    }
}
