//! Remold Maven
//!
//! Views over `pom.xml` trees and the dependency version refactorings.
//!
//! Descriptors of a multi-module build form a [`MavenProject`]: a document
//! graph in which each module points at its parent. Version rewrites follow
//! property references and dependency management up that chain, so the
//! declaration is changed rather than the place it is used.
//!
//! ```ignore
//! let project = MavenParser::new().parse_dir(Path::new("."))?;
//! let outcome = project.run(&ChangeDependencyVersion::new(
//!     "com.google.guava",
//!     Some("guava"),
//!     "29.0-jre",
//! ))?;
//! ```

mod change_version;
mod parser;
mod pom;
mod project;
mod resolve;
mod upgrade;

use std::sync::Arc;

pub use change_version::ChangeDependencyVersion;
pub use parser::MavenParser;
pub use pom::{Coordinates, Dependency, Pom, PomProperties, property_reference};
pub use project::MavenProject;
pub use resolve::{VersionSite, version_site};
pub use upgrade::{StaticVersions, UpgradeVersion, VersionSource};

use remold_core::{GraphVisitor, RemoldError, Result, VisitorConfig};
use remold_xml::Xml;

/// Build the Maven visitor a recipe entry names
pub fn visitor_from_config(
    config: &VisitorConfig,
    versions: Arc<dyn VersionSource>,
) -> Result<Box<dyn GraphVisitor<Xml>>> {
    match config.kind.as_str() {
        ChangeDependencyVersion::TYPE => Ok(Box::new(ChangeDependencyVersion::from_config(config)?)),
        UpgradeVersion::TYPE => Ok(Box::new(UpgradeVersion::from_config(config, versions)?)),
        other => Err(RemoldError::config_error(format!(
            "unknown Maven visitor '{other}'"
        ))),
    }
}
