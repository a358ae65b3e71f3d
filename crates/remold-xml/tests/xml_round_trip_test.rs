//! Round-trip and rewrite tests over realistic documents

use std::path::Path;

use remold_core::{Cursor, Handlers, Parser, Result, print, visit};
use remold_xml::{Tag, Xml, XmlKind, XmlNode, XmlParser, root_tag, with_value};

const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generated -->
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <modelVersion>4.0.0</modelVersion>

    <groupId>com.example</groupId>
    <artifactId>demo</artifactId>
    <version>1.0.0-SNAPSHOT</version>

    <properties>
        <guava.version>28.0-jre</guava.version>
        <empty/>
    </properties>

    <dependencies>
        <dependency>
            <groupId>com.google.guava</groupId>
            <artifactId>guava</artifactId>
            <version>${guava.version}</version>
        </dependency>
    </dependencies>
</project>
"#;

fn parse(text: &str) -> XmlNode {
    XmlParser::new()
        .parse_str(Path::new("pom.xml"), text)
        .unwrap()
        .root
}

#[test]
fn test_pom_round_trips() {
    assert_eq!(print(&parse(POM)), POM);
}

#[test]
fn test_rewrite_touches_only_target() {
    let doc = parse(POM);
    let root = root_tag(&doc).unwrap();
    let target = root.find("properties/guava.version").unwrap().node().id();

    let mut handlers = Handlers::<Xml>::new().on(
        XmlKind::Tag,
        move |node: XmlNode, _cursor: &Cursor<Xml>| -> Result<XmlNode> {
            if node.id() == target {
                with_value(&node, "29.0-jre")
            } else {
                Ok(node)
            }
        },
    );
    let updated = visit(&mut handlers, &doc).unwrap();

    assert_eq!(print(&updated), POM.replace("28.0-jre", "29.0-jre"));
    let root = root_tag(&updated).unwrap();
    let version = root.find("dependencies/dependency/version").unwrap();
    assert_eq!(version.value().as_deref(), Some("${guava.version}"));
}

#[test]
fn test_unchanged_subtrees_are_shared() {
    let doc = parse(POM);
    let root = root_tag(&doc).unwrap();
    let target = root.find("version").unwrap().node().clone();
    let updated_tag = with_value(&target, "2.0.0").unwrap();
    let cursor = remold_core::locate(&doc, target.id()).unwrap();
    let updated = cursor.replace(updated_tag).unwrap();

    let before = root.find("dependencies").unwrap().node();
    let after = root_tag(&updated).unwrap().find("dependencies").unwrap();
    assert!(remold_core::Node::ptr_eq(before, after.node()));
}

#[test]
fn test_tag_views() {
    let doc = parse(POM);
    let root = root_tag(&doc).unwrap();
    assert_eq!(root.attribute("xmlns").as_deref(), Some("http://maven.apache.org/POM/4.0.0"));
    assert!(root.find("properties/empty").is_some_and(|t| t.is_self_closing()));
    assert!(root.find("properties/empty").unwrap().value().is_none());
    let names: Vec<_> = root.children().map(|t: Tag<'_>| t.name()).collect();
    insta::assert_debug_snapshot!(names, @r#"
    [
        "modelVersion",
        "groupId",
        "artifactId",
        "version",
        "properties",
        "dependencies",
    ]
    "#);
}
