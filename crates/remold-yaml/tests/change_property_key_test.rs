//! Property key changes on application configuration files

use remold_core::{Parser, Refactor, SourceFile};
use remold_test::{assert_refactored, assert_round_trip, assert_unchanged, trim_indent};
use remold_yaml::{ChangePropertyKey, Yaml, YamlParser, entry_paths};

fn parse(text: &str) -> SourceFile<Yaml> {
    YamlParser::new()
        .parse_str("application.yml".as_ref(), &trim_indent(text))
        .unwrap()
}

fn change_key() -> Refactor<Yaml> {
    Refactor::new().visit(ChangePropertyKey::new(
        "management.metrics.binders.files.enabled",
        "management.metrics.enable.process.files",
    ))
}

#[test]
fn test_single_entry() {
    assert_refactored(
        &change_key(),
        &[parse("management.metrics.binders.files.enabled: true")],
        0,
        "management.metrics.enable.process.files: true",
    );
}

#[test]
fn test_nested_entry() {
    let source = parse(
        r#"
        management.metrics:
            binders:
                jvm.enabled: true
                files.enabled: true
        "#,
    );
    assert_refactored(
        &change_key(),
        &[source],
        0,
        r#"
        management.metrics:
            binders.jvm.enabled: true
            enable.process.files: true
        "#,
    );
}

#[test]
fn test_nested_entry_empty_partial_path_removed() {
    let source = parse(
        r#"
        management.metrics:
            binders:
                files.enabled: true
        "#,
    );
    assert_refactored(
        &change_key(),
        &[source],
        0,
        "management.metrics.enable.process.files: true",
    );
}

#[test]
fn test_other_documents_untouched() {
    assert_unchanged(
        &change_key(),
        &[parse(
            r#"
            management:
              metrics:
                export.prometheus.enabled: true
            "#,
        )],
    );
}

#[test]
fn test_comments_survive_a_rename() {
    let source = parse(
        r#"
        # metrics settings
        management.metrics.binders.files.enabled: true # on by default
        server.port: 8080
        "#,
    );
    assert_refactored(
        &change_key(),
        &[source],
        0,
        r#"
        # metrics settings
        management.metrics.enable.process.files: true # on by default
        server.port: 8080
        "#,
    );
}

#[test]
fn test_round_trip() {
    assert_round_trip(
        &YamlParser::new(),
        &trim_indent(
            r#"
            # Spring Boot settings
            ---
            spring:
              application.name: demo   # service id
              profiles:
                active:
                  - dev
                  - 'local'
            logging:
              pattern: |
                %d %-5level
                  %msg%n

            server.port: 8080
            "#,
        ),
    );
}

#[test]
fn test_entry_paths_snapshot() {
    let source = parse(
        r#"
        spring:
          application.name: demo
          datasource:
            url: jdbc:h2:mem:test
        server.port: 8080
        "#,
    );
    let paths: Vec<String> = entry_paths(&source.root).into_iter().map(|e| e.path).collect();
    insta::assert_debug_snapshot!(paths, @r#"
    [
        "spring",
        "spring.application.name",
        "spring.datasource",
        "spring.datasource.url",
        "server.port",
    ]
    "#);
}
