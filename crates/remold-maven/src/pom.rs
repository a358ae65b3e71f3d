//! Read-only view over a `pom.xml` tree

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use remold_core::{Node, Property, PropertySource};
use remold_xml::{Tag, Xml, root_tag};

static PROPERTY_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([^}]+)\}$").unwrap());

/// Name of the property a value refers to, for values of the form `${name}`
pub fn property_reference(value: &str) -> Option<&str> {
    PROPERTY_REFERENCE
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Maven coordinates; the version may be left to a parent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
}

impl Coordinates {
    /// Whether `other` names the same artifact, comparing versions only when both have one
    pub fn matches(&self, other: &Coordinates) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && match (&self.version, &other.version) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// A `<dependency>` element
#[derive(Debug, Clone, Copy)]
pub struct Dependency<'a> {
    tag: Tag<'a>,
    managed: bool,
}

impl<'a> Dependency<'a> {
    pub fn tag(&self) -> Tag<'a> {
        self.tag
    }

    /// Declared under `<dependencyManagement>`
    pub fn is_managed(&self) -> bool {
        self.managed
    }

    pub fn group_id(&self) -> Option<String> {
        self.tag.find("groupId").and_then(|t| t.value())
    }

    pub fn artifact_id(&self) -> Option<String> {
        self.tag.find("artifactId").and_then(|t| t.value())
    }

    pub fn version_tag(&self) -> Option<Tag<'a>> {
        self.tag.find("version")
    }

    /// Version text as written, property references unresolved
    pub fn version(&self) -> Option<String> {
        self.version_tag().and_then(|t| t.value())
    }

    pub fn scope(&self) -> Option<String> {
        self.tag.find("scope").and_then(|t| t.value())
    }

    /// Whether the dependency has `group_id` and, when given, `artifact_id`
    pub fn matches(&self, group_id: &str, artifact_id: Option<&str>) -> bool {
        self.group_id().as_deref() == Some(group_id)
            && artifact_id.is_none_or(|a| self.artifact_id().as_deref() == Some(a))
    }
}

/// View over a parsed `pom.xml`
#[derive(Debug, Clone, Copy)]
pub struct Pom<'a> {
    project: Tag<'a>,
}

impl<'a> Pom<'a> {
    /// View a document whose root element is `<project>`
    pub fn cast(document: &'a Node<Xml>) -> Option<Self> {
        root_tag(document)
            .filter(|tag| tag.name() == "project")
            .map(|project| Self { project })
    }

    pub fn project(&self) -> Tag<'a> {
        self.project
    }

    fn text(&self, path: &str) -> Option<String> {
        self.project.find(path).and_then(|t| t.value())
    }

    /// Own group id, falling back to the parent's
    pub fn group_id(&self) -> Option<String> {
        self.text("groupId").or_else(|| self.text("parent/groupId"))
    }

    pub fn artifact_id(&self) -> Option<String> {
        self.text("artifactId")
    }

    /// Own version, falling back to the parent's
    pub fn version(&self) -> Option<String> {
        self.text("version").or_else(|| self.text("parent/version"))
    }

    pub fn packaging(&self) -> String {
        self.text("packaging").unwrap_or_else(|| "jar".to_string())
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            group_id: self.group_id()?,
            artifact_id: self.artifact_id()?,
            version: self.version(),
        })
    }

    /// Coordinates declared in `<parent>`
    pub fn parent(&self) -> Option<Coordinates> {
        let parent = self.project.find("parent")?;
        Some(Coordinates {
            group_id: parent.find("groupId")?.value()?,
            artifact_id: parent.find("artifactId")?.value()?,
            version: parent.find("version").and_then(|t| t.value()),
        })
    }

    /// `<relativePath>` of the parent, when declared
    pub fn parent_relative_path(&self) -> Option<String> {
        self.text("parent/relativePath")
    }

    pub fn modules(&self) -> Vec<String> {
        self.project
            .find_all("modules/module")
            .iter()
            .filter_map(|t| t.value())
            .collect()
    }

    pub fn dependencies(&self) -> Vec<Dependency<'a>> {
        self.project
            .find_all("dependencies/dependency")
            .into_iter()
            .map(|tag| Dependency { tag, managed: false })
            .collect()
    }

    pub fn managed_dependencies(&self) -> Vec<Dependency<'a>> {
        self.project
            .find_all("dependencyManagement/dependencies/dependency")
            .into_iter()
            .map(|tag| Dependency { tag, managed: true })
            .collect()
    }

    /// Managed dependencies first, then regular ones
    pub fn all_dependencies(&self) -> Vec<Dependency<'a>> {
        let mut all = self.managed_dependencies();
        all.extend(self.dependencies());
        all
    }

    /// Entries of `<properties>`, each pointing at its element
    pub fn properties(&self) -> Vec<Property> {
        self.project
            .find("properties")
            .map(|properties| {
                properties
                    .children()
                    .map(|tag| Property {
                        name: tag.name().to_string(),
                        value: tag.value().unwrap_or_default(),
                        node: tag.node().id(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn property(&self, name: &str) -> Option<Property> {
        self.properties().into_iter().find(|p| p.name == name)
    }
}

/// Reads `<properties>` entries for document-graph property resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct PomProperties;

impl PropertySource<Xml> for PomProperties {
    fn properties(&self, root: &Node<Xml>) -> Vec<Property> {
        Pom::cast(root).map(|pom| pom.properties()).unwrap_or_default()
    }
}
