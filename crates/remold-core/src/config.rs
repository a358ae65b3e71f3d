//! Recipe configuration
//!
//! A recipe is a named, ordered list of visitor configurations. Each visitor
//! configuration names a visitor type and carries its options as free-form
//! values; the front-end crate that owns the visitor maps them onto its
//! option struct and validates them.
//!
//! ```yaml
//! recipes:
//!   - name: upgrade-spring
//!     visitors:
//!       - type: maven.UpgradeVersion
//!         groupId: org.springframework.boot
//!         toVersion: "~1.5"
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::RemoldError;
use crate::result::Result;
use crate::validated::Validated;

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoldConfig {
    #[serde(default)]
    pub recipes: Vec<RecipeConfig>,
}

impl RemoldConfig {
    pub fn recipe(&self, name: &str) -> Option<&RecipeConfig> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// Append another file's recipes; a later recipe replaces one of the same name
    pub fn merge(&mut self, other: RemoldConfig) {
        for recipe in other.recipes {
            match self.recipes.iter_mut().find(|r| r.name == recipe.name) {
                Some(existing) => *existing = recipe,
                None => self.recipes.push(recipe),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeConfig {
    pub name: String,
    #[serde(default)]
    pub visitors: Vec<VisitorConfig>,
}

/// One visitor of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub options: IndexMap<String, serde_json::Value>,
}

impl VisitorConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            options: IndexMap::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// String option; numbers and booleans are rendered as text
    pub fn string(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.options.get(key) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn required(&self, key: &str) -> Validated {
        Validated::required(key, self.string(key).as_deref())
    }
}

/// Configuration discovery and loading
pub struct ConfigLoader;

impl ConfigLoader {
    const FILE_NAMES: [&'static str; 4] = ["remold.yml", "remold.yaml", ".remold.toml", "remold.json"];

    /// Find a configuration file in `start` or the nearest directory above it
    pub fn auto_discover(start: &Path) -> Result<Option<PathBuf>> {
        let mut current = start
            .canonicalize()
            .map_err(|e| RemoldError::io_error(start, e))?;
        loop {
            for name in Self::FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    tracing::debug!("Found config: {}", candidate.display());
                    return Ok(Some(candidate));
                }
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Load a file, choosing the format from its extension
    pub fn load_from_file(path: &Path) -> Result<RemoldConfig> {
        let text = std::fs::read_to_string(path).map_err(|e| RemoldError::io_error(path, e))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::parse(&text, extension).map_err(|message| {
            RemoldError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                message
            ))
        })
    }

    fn parse(text: &str, extension: &str) -> std::result::Result<RemoldConfig, String> {
        match extension {
            "yml" | "yaml" => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            "toml" => toml::from_str(text).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(text).map_err(|e| e.to_string()),
            other => Err(format!("unsupported config format '{other}'")),
        }
    }

    /// Load every recipe file below a directory, in path order
    pub fn load_dir(dir: &Path) -> Result<RemoldConfig> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yml" | "yaml")
                )
            })
            .collect();
        files.sort();

        let mut config = RemoldConfig::default();
        for file in files {
            config.merge(Self::load_from_file(&file)?);
        }
        Ok(config)
    }

    /// Load an explicit file, or discover one starting at `start_dir`
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<RemoldConfig> {
        let path = match custom_path {
            Some(path) => path.to_path_buf(),
            None => {
                let start = start_dir.unwrap_or_else(|| Path::new("."));
                Self::auto_discover(start)?.ok_or_else(|| {
                    RemoldError::config_error(
                        "No config file found (remold.yml, remold.yaml, .remold.toml or remold.json)",
                    )
                })?
            }
        };
        Self::load_from_file(&path)
    }
}
