use remold_core::{Language, Node, Shape, StructureError};

/// Node kinds of a YAML tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YamlKind {
    // branches
    /// Several documents separated by `---`
    Stream,
    Document,
    Mapping,
    Entry,
    Sequence,
    SeqItem,

    // tokens
    /// `---`
    DocStart,
    /// Mapping key, quotes included
    Key,
    Colon,
    /// `-` of a sequence item
    Dash,
    /// Plain, quoted or block scalar as written
    Scalar,
}

impl YamlKind {
    /// Kinds that can stand as a value
    pub fn is_value(self) -> bool {
        matches!(self, YamlKind::Mapping | YamlKind::Sequence | YamlKind::Scalar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Yaml;

impl Language for Yaml {
    type Kind = YamlKind;

    fn check(kind: YamlKind, children: &[Node<Self>]) -> Result<(), StructureError> {
        use YamlKind::*;
        let shape = Shape::of(kind, children);
        match kind {
            Stream => shape
                .one("document", |k| k == Document)?
                .many(|k| k == Document)
                .end(),
            Document => shape.opt_token(DocStart).opt(YamlKind::is_value).end(),
            Mapping => shape
                .one("entry", |k| k == Entry)?
                .many(|k| k == Entry)
                .end(),
            Entry => shape
                .token(Key)?
                .token(Colon)?
                .opt(YamlKind::is_value)
                .end(),
            Sequence => shape
                .one("sequence item", |k| k == SeqItem)?
                .many(|k| k == SeqItem)
                .end(),
            SeqItem => shape.token(Dash)?.opt(YamlKind::is_value).end(),
            DocStart | Key | Colon | Dash | Scalar => shape.end(),
        }
    }
}
