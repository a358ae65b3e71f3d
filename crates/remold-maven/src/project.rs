//! Multi-module projects as document graphs

use std::path::Path;

use remold_core::graph::run;
use remold_core::{DocId, DocumentGraph, GraphOutcome, GraphVisitor, Result, SourceFile};
use remold_xml::Xml;
use tracing::{debug, warn};

use crate::pom::{Coordinates, Pom};

/// Parsed descriptors linked child → parent by their `<parent>` coordinates
#[derive(Debug, Clone, Default)]
pub struct MavenProject {
    graph: DocumentGraph<Xml>,
}

impl MavenProject {
    /// Link descriptors to their parents
    ///
    /// A parent is found by coordinates among the given sources; parents
    /// outside the set (published artifacts) are left unlinked.
    pub fn new(sources: Vec<SourceFile<Xml>>) -> Result<Self> {
        let mut graph = DocumentGraph::new();
        for source in sources {
            graph.add(source);
        }

        let docs: Vec<DocId> = graph.documents().collect();
        let coordinates: Vec<(DocId, Coordinates)> = docs
            .iter()
            .filter_map(|&doc| {
                let pom = Pom::cast(graph.root(doc))?;
                Some((doc, pom.coordinates()?))
            })
            .collect();

        for &doc in &docs {
            let Some(parent) = Pom::cast(graph.root(doc)).and_then(|pom| pom.parent()) else {
                continue;
            };
            match coordinates.iter().find(|(_, c)| c.matches(&parent)) {
                Some(&(parent_doc, _)) => {
                    debug!(
                        "'{}' inherits from '{}'",
                        graph.document(doc).path.display(),
                        graph.document(parent_doc).path.display()
                    );
                    graph.set_parent(doc, parent_doc)?;
                }
                None => warn!(
                    "Parent {} of '{}' is not part of the project",
                    parent,
                    graph.document(doc).path.display()
                ),
            }
        }
        Ok(Self { graph })
    }

    pub fn graph(&self) -> &DocumentGraph<Xml> {
        &self.graph
    }

    pub fn into_graph(self) -> DocumentGraph<Xml> {
        self.graph
    }

    pub fn get(&self, path: &Path) -> Option<DocId> {
        self.graph.get(path)
    }

    /// Descriptor declaring the given group and artifact
    pub fn find(&self, group_id: &str, artifact_id: &str) -> Option<DocId> {
        self.graph.documents().find(|&doc| {
            self.pom(doc).and_then(|p| p.coordinates()).is_some_and(|c| {
                c.group_id == group_id && c.artifact_id == artifact_id
            })
        })
    }

    pub fn pom(&self, doc: DocId) -> Option<Pom<'_>> {
        Pom::cast(self.graph.root(doc))
    }

    /// Run a visitor over every descriptor, parents first
    pub fn run<V: GraphVisitor<Xml> + ?Sized>(&self, visitor: &V) -> Result<GraphOutcome<Xml>> {
        run(&self.graph, visitor)
    }
}
