//! Adding interfaces to a class, with the imports they need

use std::sync::Arc;

use remold_core::{NodeId, Refactor, SourceFile, TypeCache};
use remold_java::{ImplementInterface, Java, JavaKind, JavaParser};
use remold_test::{assert_refactored, assert_unchanged};

const B: &str = "package b;\ninterface B {}";
const C: &str = "package c;\ninterface C {}";

fn parse(text: &str) -> (Arc<TypeCache>, Vec<SourceFile<Java>>) {
    let cache = Arc::new(TypeCache::new());
    let units = JavaParser::new(Arc::clone(&cache))
        .parse(&[text, B, C])
        .unwrap();
    (cache, units)
}

fn class_id(unit: &SourceFile<Java>) -> NodeId {
    unit.root
        .descendants()
        .find(|n| n.kind() == JavaKind::ClassDecl)
        .map(|n| n.id())
        .unwrap()
}

#[test]
fn test_first_implements_clause() {
    let (cache, units) = parse("class A {\n}");
    let refactor = Refactor::new().visit(ImplementInterface::new(cache, class_id(&units[0]), "b.B"));
    assert_refactored(
        &refactor,
        &units[..1],
        0,
        r#"
        import b.B;

        class A implements B {
        }
        "#,
    );
}

#[test]
fn test_add_to_existing_implements_clause() {
    let (cache, units) = parse("import b.B;\n\nclass A implements B {\n}");
    let refactor = Refactor::new().visit(ImplementInterface::new(cache, class_id(&units[0]), "c.C"));
    assert_refactored(
        &refactor,
        &units[..1],
        0,
        r#"
        import b.B;
        import c.C;

        class A implements C, B {
        }
        "#,
    );
}

#[test]
fn test_already_implemented() {
    let (cache, units) = parse("import b.B;\n\nclass A implements B {\n}");
    let refactor = Refactor::new().visit(ImplementInterface::new(cache, class_id(&units[0]), "b.B"));
    assert_unchanged(&refactor, &units[..1]);
}
