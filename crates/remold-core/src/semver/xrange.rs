use std::sync::LazyLock;

use regex::Regex;

use super::{Release, VersionComparator, invalid};
use crate::validated::Invalid;

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([*xX]|\d+)(?:\.([*xX]|\d+))?(?:\.([*xX]|\d+))?$").unwrap()
});

/// Wildcard selector such as `1.2.x`, `1.*` or `*`
///
/// The wildcard must be the last segment given; `1.x.0` is rejected. A
/// pattern without any wildcard is not an X-range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRange {
    fixed: Vec<u64>,
}

impl XRange {
    pub fn build(pattern: &str) -> Result<Self, Invalid> {
        let fail = || invalid("x-range", pattern);
        let caps = PATTERN.captures(pattern).ok_or_else(fail)?;
        let parts: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
        let wildcard = parts
            .iter()
            .position(|p| matches!(*p, "*" | "x" | "X"))
            .ok_or_else(fail)?;
        if wildcard != parts.len() - 1 {
            return Err(fail());
        }
        let fixed = parts[..wildcard]
            .iter()
            .map(|p| p.parse::<u64>().map_err(|_| fail()))
            .collect::<Result<_, _>>()?;
        Ok(Self { fixed })
    }
}

impl VersionComparator for XRange {
    fn is_valid(&self, version: &str) -> bool {
        let Some(release) = Release::parse(version) else {
            return false;
        };
        let (major, minor, patch) = release.triple();
        self.fixed
            .iter()
            .zip([major, minor, patch])
            .all(|(expected, actual)| *expected == actual)
    }
}
