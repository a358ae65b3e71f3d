//! Building attributed names, statements and methods from text

use std::sync::Arc;

use remold_core::{Formatting, SourceFile, TypeCache, locate, print, print_trimmed};
use remold_java::{AstNode, ClassDecl, Java, JavaKind, JavaParser, MethodDecl, TreeBuilder};
use remold_test::{assert_same_text, trim_indent};

fn parse(parser: &JavaParser, text: &str) -> SourceFile<Java> {
    parser.parse(&[&trim_indent(text)]).unwrap().remove(0)
}

#[test]
fn test_build_snippet() {
    let parser = JavaParser::new(Arc::new(TypeCache::new()));
    let unit = parse(
        &parser,
        r#"
        import java.util.List;
        public class A {
            int n = 0;

            void foo(String m, List<String> others) {
            }
        }
        "#,
    );
    let body = unit
        .root
        .descendants()
        .find_map(MethodDecl::cast)
        .and_then(|m| m.body())
        .unwrap();
    let cursor = locate(&unit.root, body.syntax().id()).unwrap();

    let statements = TreeBuilder::new(&parser)
        .build_snippet(
            &unit,
            &cursor,
            "others.add(m);\nif(others.contains(m)) {\n    others.remove(m);\n}",
        )
        .unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].kind(), JavaKind::ExprStatement);
    assert_eq!(statements[0].children()[0].kind(), JavaKind::MethodInvocation);

    let fixed = cursor.replace(body.with_statements(statements).unwrap()).unwrap();
    assert_same_text(
        &print(&fixed),
        &trim_indent(
            r#"
            import java.util.List;
            public class A {
                int n = 0;

                void foo(String m, List<String> others) {
                    others.add(m);
                    if(others.contains(m)) {
                        others.remove(m);
                    }
                }
            }
            "#,
        ),
    );
}

#[test]
fn test_snippet_sees_fields_and_parameters() {
    let parser = JavaParser::new(Arc::new(TypeCache::new()));
    let unit = parse(&parser, "class A {\n    int n;\n\n    void foo(long m) {\n    }\n}");
    let body = unit
        .root
        .descendants()
        .find(|n| n.kind() == JavaKind::Block)
        .unwrap();
    let cursor = locate(&unit.root, body.id()).unwrap();
    let statements = TreeBuilder::new(&parser)
        .build_snippet(&unit, &cursor, "n = 1;")
        .unwrap();
    let target = statements[0]
        .descendants()
        .find(|n| n.kind() == JavaKind::Ident)
        .unwrap();
    assert_eq!(target.text(), Some("n"));
    assert!(target.ty().is_some());
}

#[test]
fn test_build_method() {
    let cache = Arc::new(TypeCache::new());
    let parser = JavaParser::new(Arc::clone(&cache));
    let unit = parse(&parser, "package a;\n\nclass A {\n}");
    let source = "B build() {\n    return new B();\n}";

    let method = TreeBuilder::new(&parser)
        .build_method(&unit, source, &["b.B"])
        .unwrap();
    assert_eq!(print_trimmed(&method), source);
    let view = MethodDecl::cast(&method).unwrap();
    assert_eq!(view.name(), "build");
    assert_eq!(
        view.return_type().and_then(|t| t.ty()),
        Some(cache.build_class("b.B"))
    );
}

#[test]
fn test_build_qualified_name() {
    let parser = JavaParser::new(Arc::new(TypeCache::new()));
    let builder = TreeBuilder::new(&parser);

    let list = builder.build_name("java.util.List", Formatting::EMPTY).unwrap();
    assert_eq!(list.kind(), JavaKind::FieldAccess);
    assert_eq!(print(&list), "java.util.List");
    assert_eq!(list.children()[2].text(), Some("List"));
    assert_eq!(
        list.ty().and_then(|ty| parser.cache().fqn(ty)).as_deref(),
        Some("java.util.List")
    );
}

#[test]
fn test_build_nested_and_star_names() {
    let parser = JavaParser::new(Arc::new(TypeCache::new()));
    let builder = TreeBuilder::new(&parser);
    let cache = parser.cache();

    let inner = builder.build_name("a.Outer.Inner", Formatting::EMPTY).unwrap();
    assert_eq!(inner.ty().and_then(|ty| cache.fqn(ty)).as_deref(), Some("a.Outer.Inner"));
    let outer = &inner.children()[0];
    assert_eq!(outer.ty().and_then(|ty| cache.fqn(ty)).as_deref(), Some("a.Outer"));

    let star = builder.build_name("a.A.*", Formatting::new(" ")).unwrap();
    assert_eq!(star.children()[2].text(), Some("*"));
    assert_eq!(print(&star), " a.A.*");
}

#[test]
fn test_insert_built_method() {
    let parser = JavaParser::new(Arc::new(TypeCache::new()));
    let unit = parse(&parser, "class A {\n    int n;\n}");
    let method = TreeBuilder::new(&parser)
        .build_method(&unit, "int get() {\n    return n;\n}", &[])
        .unwrap();
    let class = ClassDecl::cast(&unit.root.children()[0]).unwrap();
    let body = class.body().unwrap();
    let mut members = body.children().to_vec();
    members.insert(members.len() - 1, method);
    let cursor = locate(&unit.root, body.id()).unwrap();
    let fixed = cursor.replace(body.with_children(members).unwrap()).unwrap();
    assert_same_text(
        &print(&fixed),
        "class A {\n    int n;\n    int get() {\n        return n;\n    }\n}",
    );
}
