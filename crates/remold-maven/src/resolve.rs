//! Locating where a dependency's version is actually declared
//!
//! The version of a dependency can be written literally, taken from a
//! `${property}` declared in the same descriptor or any parent, or omitted
//! and supplied by a `<dependencyManagement>` entry of the descriptor or a
//! parent. Rewrites must happen at the declaration, so each case resolves
//! to the element holding the text.

use std::iter;

use remold_core::{DocId, DocumentGraph, NodeId, RemoldError, Result, resolve_property};
use remold_xml::Xml;

use crate::pom::{Dependency, Pom, PomProperties, property_reference};

/// Element whose text is a dependency's effective version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSite {
    /// Document declaring the version
    pub doc: DocId,
    /// The `<version>` or property element
    pub tag: NodeId,
    pub value: String,
    /// Property the version was read through, if any
    pub property: Option<String>,
}

/// Resolve the declaration site of the version of `dependency`, which lives in `doc`
///
/// A managed dependency without a version has nothing to resolve and yields
/// `None`. A regular dependency whose version is neither written nor managed
/// anywhere up the parent chain is an unresolvable target.
pub fn version_site(
    graph: &DocumentGraph<Xml>,
    doc: DocId,
    dependency: &Dependency<'_>,
) -> Result<Option<VersionSite>> {
    if let Some(version) = dependency.version_tag() {
        return declared_site(graph, doc, doc, version.node().id(), version.value()).map(Some);
    }
    if dependency.is_managed() {
        return Ok(None);
    }

    let group_id = dependency.group_id().unwrap_or_default();
    let artifact_id = dependency.artifact_id();
    for candidate in iter::once(doc).chain(graph.ancestors(doc)) {
        let Some(pom) = Pom::cast(graph.root(candidate)) else {
            continue;
        };
        let managed = pom.managed_dependencies().into_iter().find(|m| {
            m.matches(&group_id, artifact_id.as_deref()) && m.version_tag().is_some()
        });
        if let Some(version) = managed.and_then(|m| m.version_tag()) {
            return declared_site(graph, doc, candidate, version.node().id(), version.value())
                .map(Some);
        }
    }

    Err(RemoldError::unresolvable(
        &graph.document(doc).path,
        format!(
            "version of {}:{}",
            group_id,
            artifact_id.unwrap_or_default()
        ),
    ))
}

/// Follow a property reference; properties resolve from the using document upward
fn declared_site(
    graph: &DocumentGraph<Xml>,
    origin: DocId,
    doc: DocId,
    tag: NodeId,
    value: Option<String>,
) -> Result<VersionSite> {
    let value = value.unwrap_or_default();
    match property_reference(&value) {
        Some(name) => {
            let (owner, property) = resolve_property(graph, &PomProperties, origin, name)?;
            Ok(VersionSite {
                doc: owner,
                tag: property.node,
                value: property.value,
                property: Some(name.to_string()),
            })
        }
        None => Ok(VersionSite {
            doc,
            tag,
            value,
            property: None,
        }),
    }
}
