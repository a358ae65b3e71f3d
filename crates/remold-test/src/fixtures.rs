//! On-disk fixtures

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::trim_indent;

/// A temporary directory of source files, removed on drop
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    #[track_caller]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap_or_else(|e| panic!("cannot create temp dir: {e}")),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` (indentation trimmed) to `relative`, creating directories
    #[track_caller]
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("cannot create {}: {e}", parent.display()));
        }
        fs::write(&path, trim_indent(content))
            .unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
        path
    }

    #[track_caller]
    pub fn read(&self, relative: &str) -> String {
        let path = self.dir.path().join(relative);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
