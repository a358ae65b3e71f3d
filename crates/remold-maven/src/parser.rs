//! Descriptor parsing

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use remold_core::{Parser, RemoldError, Result, SourceFile};
use remold_xml::{Xml, XmlParser};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::pom::Pom;
use crate::project::MavenProject;

const DESCRIPTOR: &str = "pom.xml";

/// Parses `pom.xml` files, rejecting XML whose root is not `<project>`
#[derive(Debug, Clone, Default)]
pub struct MavenParser {
    xml: XmlParser,
}

impl MavenParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse in-memory descriptors into a linked project
    pub fn parse_project(&self, inputs: &[(PathBuf, String)]) -> Result<MavenProject> {
        let sources = inputs
            .par_iter()
            .map(|(path, text)| self.parse_str(path, text))
            .collect::<Result<Vec<_>>>()?;
        MavenProject::new(sources)
    }

    /// Find and parse every descriptor below `dir`
    ///
    /// Hidden directories and `target` build output are skipped.
    pub fn parse_dir(&self, dir: &Path) -> Result<MavenProject> {
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == DESCRIPTOR)
            .map(DirEntry::into_path)
            .collect();
        paths.sort();
        info!("Found {} descriptors below '{}'", paths.len(), dir.display());

        let sources = paths
            .par_iter()
            .map(|path| self.parse_path(path))
            .collect::<Result<Vec<_>>>()?;
        MavenProject::new(sources)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "target")
}

impl Parser<Xml> for MavenParser {
    fn parse_str(&self, path: &Path, text: &str) -> Result<SourceFile<Xml>> {
        let root = self.xml.parse_document(path, text)?;
        if Pom::cast(&root).is_none() {
            return Err(RemoldError::parse_error(
                path,
                0,
                "root element is not <project>",
            ));
        }
        debug!("Parsed descriptor '{}'", path.display());
        Ok(SourceFile::new(path, root))
    }
}
