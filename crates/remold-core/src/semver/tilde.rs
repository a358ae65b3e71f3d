use std::sync::LazyLock;

use regex::Regex;

use super::{Release, VersionComparator, invalid, segments};
use crate::validated::Invalid;

static PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~(\d+)(?:\.(\d+))?(?:\.(\d+))?$").unwrap());

/// Patch-level changes when a minor version is given, minor-level otherwise
///
/// `~1.2.3` is `>=1.2.3 <1.3.0`, `~1.2` is `>=1.2.0 <1.3.0`, `~1` is
/// `>=1.0.0 <2.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TildeRange {
    lower: (u64, u64, u64),
    upper: (u64, u64, u64),
}

impl TildeRange {
    pub fn build(pattern: &str) -> Result<Self, Invalid> {
        let release = PATTERN
            .captures(pattern)
            .and_then(|caps| segments(&caps, 1))
            .ok_or_else(|| invalid("tilde range", pattern))?;
        let upper = match release.minor {
            Some(minor) => (release.major, minor + 1, 0),
            None => (release.major + 1, 0, 0),
        };
        Ok(Self {
            lower: release.triple(),
            upper,
        })
    }
}

impl VersionComparator for TildeRange {
    fn is_valid(&self, version: &str) -> bool {
        Release::parse(version)
            .map(|r| r.triple())
            .is_some_and(|v| self.lower <= v && v < self.upper)
    }
}
