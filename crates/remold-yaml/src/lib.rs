//! Remold YAML
//!
//! A lossless front-end for block-style YAML (mappings, sequences, plain,
//! quoted and block scalars) and the property key refactorings used on
//! application configuration files.
//!
//! Properties are addressed by dotted path, whether a document spells them
//! as nested mappings or as dotted keys: `server.port` matches both
//! `server.port: 80` and `server:\n  port: 80`.

mod change_key;
mod coalesce;
mod parser;
mod syntax;
mod view;

pub use change_key::ChangePropertyKey;
pub use coalesce::CoalesceProperties;
pub use parser::YamlParser;
pub use syntax::{Yaml, YamlKind};
pub use view::{
    EntryPath, YamlProperties, documents, entry_paths, find_entry, key, root_mapping, scalar_value, value,
};

use remold_core::{RefactorVisitor, RemoldError, Result, VisitorConfig};

/// A node of a YAML tree
pub type YamlNode = remold_core::Node<Yaml>;

/// Build the YAML visitor a recipe entry names
pub fn visitor_from_config(config: &VisitorConfig) -> Result<Box<dyn RefactorVisitor<Yaml>>> {
    match config.kind.as_str() {
        ChangePropertyKey::TYPE => Ok(Box::new(ChangePropertyKey::from_config(config)?)),
        CoalesceProperties::TYPE => Ok(Box::new(CoalesceProperties)),
        other => Err(RemoldError::config_error(format!(
            "unknown YAML visitor '{other}'"
        ))),
    }
}
