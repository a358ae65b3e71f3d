//! Set the version of matching dependencies

use remold_core::{
    DocId, DocumentGraph, GraphEdits, GraphVisitor, Node, NodeId, RefactorContext,
    RefactorVisitor, RemoldError, Result, SourceFile, Validated, VisitorConfig, locate,
};
use remold_xml::{Tag, Xml, with_value};
use tracing::debug;

use crate::pom::Pom;
use crate::resolve::version_site;

/// Change the version of a group's dependencies, or of one artifact
///
/// The new version is written where the effective version is declared: the
/// dependency's own `<version>`, the property it refers to, or the managing
/// `<dependencyManagement>` entry, searching parents as needed. Property
/// reference text is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDependencyVersion {
    pub group_id: String,
    pub artifact_id: Option<String>,
    pub to_version: String,
}

impl ChangeDependencyVersion {
    pub const TYPE: &'static str = "maven.ChangeDependencyVersion";

    pub fn new(
        group_id: impl Into<String>,
        artifact_id: Option<&str>,
        to_version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.map(str::to_string),
            to_version: to_version.into(),
        }
    }

    pub fn from_config(config: &VisitorConfig) -> Result<Self> {
        config
            .required("groupId")
            .and(config.required("toVersion"))
            .into_result()?;
        let visitor = Self {
            group_id: config.string("groupId").unwrap_or_default(),
            artifact_id: config.string("artifactId"),
            to_version: config.string("toVersion").unwrap_or_default(),
        };
        visitor.validate().into_result()?;
        Ok(visitor)
    }

    pub fn validate(&self) -> Validated {
        Validated::not_blank("groupId", Some(self.group_id.as_str()))
            .and(Validated::not_blank("toVersion", Some(self.to_version.as_str())))
    }

    /// Version elements to rewrite for the dependencies of `doc`
    fn targets(&self, graph: &DocumentGraph<Xml>, doc: DocId) -> Result<Vec<(DocId, NodeId)>> {
        let Some(pom) = Pom::cast(graph.root(doc)) else {
            return Ok(Vec::new());
        };
        let mut targets = Vec::new();
        for dependency in pom.all_dependencies() {
            if !dependency.matches(&self.group_id, self.artifact_id.as_deref()) {
                continue;
            }
            if let Some(site) = version_site(graph, doc, &dependency)? {
                if site.value != self.to_version && !targets.contains(&(site.doc, site.tag)) {
                    targets.push((site.doc, site.tag));
                }
            }
        }
        Ok(targets)
    }
}

impl GraphVisitor<Xml> for ChangeDependencyVersion {
    fn name(&self) -> &str {
        "ChangeDependencyVersion"
    }

    fn visit_document(
        &self,
        graph: &DocumentGraph<Xml>,
        doc: DocId,
        edits: &mut GraphEdits<Xml>,
    ) -> Result<()> {
        for (target_doc, tag) in self.targets(graph, doc)? {
            let root = edits.root(graph, target_doc);
            let cursor = locate(&root, tag).ok_or_else(|| {
                RemoldError::visitor_error(
                    GraphVisitor::name(self),
                    format!("version element {tag} vanished from its document"),
                )
            })?;
            let current = Tag::cast(cursor.node()).and_then(|t| t.value());
            if current.as_deref() == Some(self.to_version.as_str()) {
                continue;
            }
            debug!(
                "Setting {} to {} in '{}'",
                Tag::cast(cursor.node()).map(|t| t.name()).unwrap_or_default(),
                self.to_version,
                graph.document(target_doc).path.display()
            );
            let updated = with_value(cursor.node(), &self.to_version)?;
            edits.replace(target_doc, cursor.replace(updated)?);
        }
        Ok(())
    }
}

impl RefactorVisitor<Xml> for ChangeDependencyVersion {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    fn validate(&self) -> Validated {
        ChangeDependencyVersion::validate(self)
    }

    /// Rewrites one descriptor on its own; parent declarations are out of reach
    fn refactor(&self, source: &SourceFile<Xml>, _ctx: &mut RefactorContext<Xml>) -> Result<Node<Xml>> {
        visit_single(self, source)
    }
}

/// Run a graph visitor over a one-document graph
pub(crate) fn visit_single<V: GraphVisitor<Xml>>(
    visitor: &V,
    source: &SourceFile<Xml>,
) -> Result<Node<Xml>> {
    let mut graph = DocumentGraph::new();
    let doc = graph.add(source.clone());
    let outcome = remold_core::graph::run(&graph, visitor)?;
    if let Some((_, error)) = outcome.failures.into_iter().next() {
        return Err(error);
    }
    Ok(outcome.graph.root(doc).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = VisitorConfig::new(ChangeDependencyVersion::TYPE)
            .with_option("groupId", "com.google.guava")
            .with_option("artifactId", "guava")
            .with_option("toVersion", "29.0-jre");
        let visitor = ChangeDependencyVersion::from_config(&config).unwrap();
        assert_eq!(
            visitor,
            ChangeDependencyVersion::new("com.google.guava", Some("guava"), "29.0-jre")
        );

        let missing = VisitorConfig::new(ChangeDependencyVersion::TYPE).with_option("groupId", "g");
        let err = ChangeDependencyVersion::from_config(&missing).unwrap_err();
        assert!(err.to_string().contains("toVersion is required"));
    }

    #[test]
    fn test_blank_options_are_invalid() {
        let visitor = ChangeDependencyVersion::new(" ", None, "1.0");
        assert!(ChangeDependencyVersion::validate(&visitor).is_invalid());
    }
}
