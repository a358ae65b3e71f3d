//! Renaming variables without touching shadowed or shadowing ones

use std::sync::Arc;

use remold_core::{Node, Refactor, SourceFile, TypeCache};
use remold_java::{
    AstNode, Block, ClassDecl, CompilationUnit, Java, JavaKind, JavaParser, RenameVariable,
    VariableDecls,
};
use remold_test::{assert_refactored, assert_unchanged, trim_indent};

fn parse(text: &str) -> SourceFile<Java> {
    JavaParser::new(Arc::new(TypeCache::new()))
        .parse(&[&trim_indent(text)])
        .unwrap()
        .remove(0)
}

fn class(unit: &SourceFile<Java>) -> ClassDecl<'_> {
    CompilationUnit::cast(&unit.root).unwrap().classes().next().unwrap()
}

#[test]
fn test_rename_variable() {
    let unit = parse(
        r#"
        public class B {
           int n;

           {
              int n;
              n = 1;
              n /= 2;
              if(n + 1 == 2) {}
              n++;
           }

           public int foo(int n) {
              return n + this.n;
           }
        }
        "#,
    );
    let b = class(&unit);
    let init = b
        .members()
        .find(|m| m.kind() == JavaKind::Block)
        .and_then(Block::cast)
        .unwrap();
    let block_var = init
        .statements()
        .find_map(VariableDecls::cast)
        .and_then(|d| d.vars().next())
        .unwrap()
        .id();
    let param = b
        .methods()
        .find(|m| m.name() == "foo")
        .and_then(|m| m.params().next())
        .and_then(|p| p.vars().next())
        .unwrap()
        .id();

    let refactor = Refactor::new()
        .visit(RenameVariable::new(block_var, "n1"))
        .visit(RenameVariable::new(param, "n2"));
    assert_refactored(
        &refactor,
        &[unit],
        0,
        r#"
        public class B {
           int n;

           {
              int n1;
              n1 = 1;
              n1 /= 2;
              if(n1 + 1 == 2) {}
              n1++;
           }

           public int foo(int n2) {
              return n2 + this.n;
           }
        }
        "#,
    );
}

#[test]
fn test_rename_by_name_token() {
    let unit = parse("class A { void f(int a) { int b = a; a = b; } }");
    let name = unit
        .root
        .descendants()
        .find(|n| n.kind() == JavaKind::Ident && n.text() == Some("a"))
        .unwrap()
        .id();
    assert_refactored(
        &Refactor::new().visit(RenameVariable::new(name, "x")),
        &[unit],
        0,
        "class A { void f(int x) { int b = x; x = b; } }",
    );
}

#[test]
fn test_other_units_untouched() {
    let parser = JavaParser::new(Arc::new(TypeCache::new()));
    let units = parser
        .parse(&["class A { int n; }", "class B { int n; void f() { n++; } }"])
        .unwrap();
    let field = units[0]
        .root
        .descendants()
        .find(|n| n.kind() == JavaKind::NamedVar)
        .map(Node::id)
        .unwrap();
    assert_unchanged(&Refactor::new().visit(RenameVariable::new(field, "m")), &units[1..]);
}

#[test]
fn test_rename_field_leaves_shadowing_locals() {
    let unit = parse(
        r#"
        public class B {
           int n;

           {
              int n;
              n = 1;
           }

           public int foo(int m) {
              return m + n + this.n;
           }
        }
        "#,
    );
    let field = class(&unit).fields().next().and_then(|f| f.vars().next()).unwrap().id();
    assert_refactored(
        &Refactor::new().visit(RenameVariable::new(field, "count")),
        &[unit],
        0,
        r#"
        public class B {
           int count;

           {
              int n;
              n = 1;
           }

           public int foo(int m) {
              return m + count + this.count;
           }
        }
        "#,
    );
}

#[test]
fn test_rename_inherited_field() {
    let unit = parse(
        r#"
        class A {
           int n;
        }
        class B extends A {
           void f() {
              n = 1;
              this.n = 2;
           }
        }
        class C extends A {
           int n;
           void g() {
              n = 3;
           }
        }
        "#,
    );
    let field = class(&unit).fields().next().and_then(|f| f.vars().next()).unwrap().id();
    assert_refactored(
        &Refactor::new().visit(RenameVariable::new(field, "m")),
        &[unit],
        0,
        r#"
        class A {
           int m;
        }
        class B extends A {
           void f() {
              m = 1;
              this.m = 2;
           }
        }
        class C extends A {
           int n;
           void g() {
              n = 3;
           }
        }
        "#,
    );
}
