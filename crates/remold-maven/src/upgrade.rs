//! Upgrade dependencies to the newest version a selector accepts

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use remold_core::{
    Comparator, DocId, DocumentGraph, GraphEdits, GraphVisitor, Node, RefactorContext,
    RefactorVisitor, Result, Semver, SourceFile, Validated, VersionComparator, VisitorConfig,
};
use remold_xml::Xml;
use tracing::debug;

use crate::change_version::ChangeDependencyVersion;
use crate::pom::Pom;
use crate::resolve::version_site;

/// Where the versions available for an artifact come from
pub trait VersionSource: Send + Sync {
    fn versions(&self, group_id: &str, artifact_id: &str) -> Vec<String>;
}

/// A fixed table of available versions
#[derive(Debug, Clone, Default)]
pub struct StaticVersions {
    versions: IndexMap<(String, String), Vec<String>>,
}

impl StaticVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, group_id: &str, artifact_id: &str, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions
            .entry((group_id.to_string(), artifact_id.to_string()))
            .or_default()
            .extend(versions.into_iter().map(Into::into));
        self
    }
}

impl VersionSource for StaticVersions {
    fn versions(&self, group_id: &str, artifact_id: &str) -> Vec<String> {
        self.versions
            .get(&(group_id.to_string(), artifact_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Upgrade a group's dependencies, or one artifact, within a version selector
///
/// `to_version` uses node-semver range syntax (`~1.5`, `1.2.x`, `1 - 2`,
/// `latest.release`). The newest available version accepted by the selector
/// and newer than the current one wins; the rewrite itself is delegated to
/// [`ChangeDependencyVersion`].
#[derive(Clone)]
pub struct UpgradeVersion {
    pub group_id: String,
    pub artifact_id: Option<String>,
    pub to_version: String,
    versions: Arc<dyn VersionSource>,
}

impl fmt::Debug for UpgradeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeVersion")
            .field("group_id", &self.group_id)
            .field("artifact_id", &self.artifact_id)
            .field("to_version", &self.to_version)
            .finish_non_exhaustive()
    }
}

impl UpgradeVersion {
    pub const TYPE: &'static str = "maven.UpgradeVersion";

    pub fn new(
        group_id: impl Into<String>,
        artifact_id: Option<&str>,
        to_version: impl Into<String>,
        versions: Arc<dyn VersionSource>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.map(str::to_string),
            to_version: to_version.into(),
            versions,
        }
    }

    pub fn from_config(config: &VisitorConfig, versions: Arc<dyn VersionSource>) -> Result<Self> {
        config
            .required("groupId")
            .and(config.required("toVersion"))
            .into_result()?;
        let visitor = Self::new(
            config.string("groupId").unwrap_or_default(),
            config.string("artifactId").as_deref(),
            config.string("toVersion").unwrap_or_default(),
            versions,
        );
        visitor.validate().into_result()?;
        Ok(visitor)
    }

    pub fn validate(&self) -> Validated {
        Validated::not_blank("groupId", Some(self.group_id.as_str()))
            .and(Validated::not_blank("toVersion", Some(self.to_version.as_str())))
            .and(Semver::validate(&self.to_version))
    }

    /// Follow-up rewrites for the matching dependencies of `doc`
    fn upgrades(
        &self,
        graph: &DocumentGraph<Xml>,
        doc: DocId,
        comparator: &Comparator,
    ) -> Result<Vec<ChangeDependencyVersion>> {
        let Some(pom) = Pom::cast(graph.root(doc)) else {
            return Ok(Vec::new());
        };
        let mut upgrades = Vec::new();
        for dependency in pom.all_dependencies() {
            if !dependency.matches(&self.group_id, self.artifact_id.as_deref()) {
                continue;
            }
            let Some(site) = version_site(graph, doc, &dependency)? else {
                continue;
            };
            let artifact_id = dependency.artifact_id().unwrap_or_default();
            let available = self.versions.versions(&self.group_id, &artifact_id);
            if let Some(newer) = comparator.upgrade(&site.value, available.iter().map(String::as_str)) {
                debug!(
                    "{}:{} {} can be upgraded to {}",
                    self.group_id, artifact_id, site.value, newer
                );
                let change =
                    ChangeDependencyVersion::new(&self.group_id, self.artifact_id.as_deref(), newer);
                if !upgrades.contains(&change) {
                    upgrades.push(change);
                }
            }
        }
        Ok(upgrades)
    }
}

impl GraphVisitor<Xml> for UpgradeVersion {
    fn name(&self) -> &str {
        "UpgradeVersion"
    }

    fn visit_document(
        &self,
        graph: &DocumentGraph<Xml>,
        doc: DocId,
        edits: &mut GraphEdits<Xml>,
    ) -> Result<()> {
        let comparator = Semver::comparator(&self.to_version)?;
        for change in self.upgrades(graph, doc, &comparator)? {
            change.visit_document(graph, doc, edits)?;
        }
        Ok(())
    }
}

impl RefactorVisitor<Xml> for UpgradeVersion {
    fn name(&self) -> String {
        Self::TYPE.to_string()
    }

    /// Each run moves to whatever is newest at the time
    fn is_idempotent(&self) -> bool {
        false
    }

    fn validate(&self) -> Validated {
        UpgradeVersion::validate(self)
    }

    fn refactor(&self, source: &SourceFile<Xml>, ctx: &mut RefactorContext<Xml>) -> Result<Node<Xml>> {
        let comparator = Semver::comparator(&self.to_version)?;
        let mut graph = DocumentGraph::new();
        let doc = graph.add(source.clone());
        for change in self.upgrades(&graph, doc, &comparator)? {
            ctx.and_then(change);
        }
        Ok(source.root.clone())
    }
}
