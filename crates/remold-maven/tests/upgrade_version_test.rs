//! Upgrading within a version selector

use std::sync::Arc;

use remold_core::{Parser, Refactor, print_trimmed};
use remold_maven::{MavenParser, StaticVersions, UpgradeVersion, VersionSource};
use remold_test::{TempProject, assert_refactored, assert_unchanged, trim_indent};

const POM: &str = r#"
    <project>
      <modelVersion>4.0.0</modelVersion>

      <groupId>com.mycompany.app</groupId>
      <artifactId>my-app</artifactId>
      <version>1</version>

      <dependencies>
        <dependency>
          <groupId>org.springframework.boot</groupId>
          <artifactId>spring-boot</artifactId>
          <version>1.5.1.RELEASE</version>
          <scope>test</scope>
        </dependency>
      </dependencies>
    </project>
    "#;

fn available() -> Arc<dyn VersionSource> {
    Arc::new(StaticVersions::new().with(
        "org.springframework.boot",
        "spring-boot",
        [
            "1.4.7.RELEASE",
            "1.5.1.RELEASE",
            "1.5.9.RELEASE",
            "1.5.22.RELEASE",
            "2.0.0.RELEASE",
            "2.3.4.RELEASE",
        ],
    ))
}

fn upgrade(to_version: &str) -> UpgradeVersion {
    UpgradeVersion::new("org.springframework.boot", None, to_version, available())
}

#[test]
fn test_upgrade_version() {
    let source = MavenParser::new()
        .parse_str("pom.xml".as_ref(), &trim_indent(POM))
        .unwrap();

    assert_refactored(
        &Refactor::new().visit(upgrade("~1.5")),
        &[source],
        0,
        &POM.replace("1.5.1.RELEASE", "1.5.22.RELEASE"),
    );
}

#[test]
fn test_change_is_reported_under_follow_up() {
    let source = MavenParser::new()
        .parse_str("pom.xml".as_ref(), &trim_indent(POM))
        .unwrap();
    let outcome = Refactor::new().visit(upgrade("1.x")).fix(&[source]).unwrap();
    let change = &outcome.changes[0];
    assert_eq!(change.visitors, vec!["maven.ChangeDependencyVersion".to_string()]);
    assert!(change.diff().contains("+      <version>1.5.22.RELEASE</version>"));
}

#[test]
fn test_nothing_newer_in_range() {
    let source = MavenParser::new()
        .parse_str(
            "pom.xml".as_ref(),
            &trim_indent(&POM.replace("1.5.1.RELEASE", "1.5.22.RELEASE")),
        )
        .unwrap();
    assert_unchanged(&Refactor::new().visit(upgrade("~1.5")), &[source]);
}

#[test]
fn test_invalid_selector_fails_the_batch() {
    let source = MavenParser::new()
        .parse_str("pom.xml".as_ref(), &trim_indent(POM))
        .unwrap();
    assert!(Refactor::new().visit(upgrade("*.0.0")).fix(&[source]).is_err());
}

#[test]
fn test_upgrade_through_parent_property() {
    let project = TempProject::new();
    project.write(
        "pom.xml",
        r#"
        <project>
          <groupId>com.mycompany.app</groupId>
          <artifactId>my-app</artifactId>
          <version>1</version>
          <packaging>pom</packaging>
          <properties>
            <spring-boot.version>1.5.1.RELEASE</spring-boot.version>
          </properties>
        </project>
        "#,
    );
    project.write(
        "app/pom.xml",
        r#"
        <project>
          <parent>
            <groupId>com.mycompany.app</groupId>
            <artifactId>my-app</artifactId>
            <version>1</version>
          </parent>
          <artifactId>app</artifactId>
          <dependencies>
            <dependency>
              <groupId>org.springframework.boot</groupId>
              <artifactId>spring-boot</artifactId>
              <version>${spring-boot.version}</version>
            </dependency>
          </dependencies>
        </project>
        "#,
    );
    let maven = MavenParser::new().parse_dir(project.path()).unwrap();
    let outcome = maven.run(&upgrade("latest.release")).unwrap();

    let parent = outcome.graph.get(&project.path().join("pom.xml")).unwrap();
    let text = print_trimmed(outcome.graph.root(parent));
    assert!(text.contains("<spring-boot.version>2.3.4.RELEASE</spring-boot.version>"));
    assert_eq!(outcome.changed, vec![parent]);
}
