//! Out-of-band annotations attached to nodes
//!
//! Markers never influence printing or structure; they let a search or lint
//! pass leave results on the tree for a later consumer.

use serde::{Deserialize, Serialize};

/// A single annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// The node matched a search
    SearchResult { description: Option<String> },
    /// The node violates a lint rule
    LintViolation { rule: String, message: String },
    /// Caller-defined annotation
    Custom { name: String, value: String },
}

impl Marker {
    pub fn search_result() -> Self {
        Marker::SearchResult { description: None }
    }
}

/// Ordered set of markers on one node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Markers(Vec<Marker>);

impl Markers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.0.iter()
    }

    pub fn contains(&self, marker: &Marker) -> bool {
        self.0.contains(marker)
    }

    /// Whether any search result marker is present
    pub fn is_search_result(&self) -> bool {
        self.0
            .iter()
            .any(|m| matches!(m, Marker::SearchResult { .. }))
    }

    /// A copy with `marker` appended unless already present
    pub fn with(&self, marker: Marker) -> Self {
        let mut markers = self.0.clone();
        if !markers.contains(&marker) {
            markers.push(marker);
        }
        Self(markers)
    }
}
