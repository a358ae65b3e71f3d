//! Version selectors
//!
//! Dependency upgrades pick the newest available version that a selector
//! accepts. Supported selectors follow node-semver's advanced range syntax:
//!
//! | selector | example | meaning |
//! |----------|---------|---------|
//! | latest release | `latest.release` | any release version |
//! | X-range | `1.2.x`, `1.*`, `*` | wildcard in the last given segment |
//! | tilde range | `~1.5` | `>=1.5.0 <1.6.0` |
//! | hyphen range | `1.2 - 2.3.4` | `>=1.2.0 <=2.3.4` |
//!
//! Versions are compared by numeric segments; a trailing `.RELEASE` is
//! ignored (`1.5.22.RELEASE` is `1.5.22`).

mod hyphen;
mod latest;
mod tilde;
mod xrange;

pub use hyphen::HyphenRange;
pub use latest::LatestRelease;
pub use tilde::TildeRange;
pub use xrange::XRange;

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::result::Result;
use crate::validated::{Invalid, Validated};

static RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?$").unwrap());

/// A release version split into numeric segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
}

impl Release {
    pub fn parse(version: &str) -> Option<Self> {
        let caps = RELEASE.captures(normalize(version))?;
        segments(&caps, 1)
    }

    /// Missing segments read as zero
    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor.unwrap_or(0), self.patch.unwrap_or(0))
    }
}

/// Strip a trailing `.RELEASE` qualifier
pub fn normalize(version: &str) -> &str {
    version.strip_suffix(".RELEASE").unwrap_or(version)
}

/// Read three optional numeric groups starting at capture group `first`
pub(crate) fn segments(caps: &Captures<'_>, first: usize) -> Option<Release> {
    let group = |i: usize| -> Option<Option<u64>> {
        match caps.get(first + i) {
            Some(m) => m.as_str().parse().ok().map(Some),
            None => Some(None),
        }
    };
    Some(Release {
        major: group(0)??,
        minor: group(1)?,
        patch: group(2)?,
    })
}

/// Decides which versions a selector accepts and how versions order
pub trait VersionComparator {
    fn is_valid(&self, version: &str) -> bool;

    fn compare(&self, v1: &str, v2: &str) -> Ordering {
        LatestRelease.compare(v1, v2)
    }

    /// Newest accepted version that is newer than `current`
    fn upgrade<'a>(&self, current: &str, available: impl IntoIterator<Item = &'a str>) -> Option<&'a str>
    where
        Self: Sized,
    {
        available
            .into_iter()
            .filter(|v| self.is_valid(v))
            .filter(|v| LatestRelease.compare(current, v) == Ordering::Less)
            .max_by(|a, b| self.compare(a, b))
    }
}

/// Any supported selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator {
    Latest(LatestRelease),
    X(XRange),
    Tilde(TildeRange),
    Hyphen(HyphenRange),
}

impl VersionComparator for Comparator {
    fn is_valid(&self, version: &str) -> bool {
        match self {
            Comparator::Latest(c) => c.is_valid(version),
            Comparator::X(c) => c.is_valid(version),
            Comparator::Tilde(c) => c.is_valid(version),
            Comparator::Hyphen(c) => c.is_valid(version),
        }
    }
}

/// Selector parsing
pub struct Semver;

impl Semver {
    /// Parse a selector, trying each syntax in turn
    pub fn parse(pattern: &str) -> std::result::Result<Comparator, Invalid> {
        LatestRelease::build(pattern)
            .map(Comparator::Latest)
            .or_else(|_| XRange::build(pattern).map(Comparator::X))
            .or_else(|_| TildeRange::build(pattern).map(Comparator::Tilde))
            .or_else(|_| HyphenRange::build(pattern).map(Comparator::Hyphen))
            .map_err(|_| Invalid {
                property: "version".to_string(),
                value: Some(pattern.to_string()),
                message: "is not a valid version selector".to_string(),
            })
    }

    pub fn validate(pattern: &str) -> Validated {
        match Self::parse(pattern) {
            Ok(_) => Validated::valid(),
            Err(invalid) => Validated::invalid(
                &invalid.property,
                invalid.value.as_deref(),
                invalid.message,
            ),
        }
    }

    pub fn comparator(pattern: &str) -> Result<Comparator> {
        Self::parse(pattern).map_err(|invalid| crate::error::RemoldError::Validation {
            failures: vec![invalid],
        })
    }
}

pub(crate) fn invalid(kind: &str, pattern: &str) -> Invalid {
    Invalid {
        property: kind.to_string(),
        value: Some(pattern.to_string()),
        message: format!("is not a {kind}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_parsing() {
        assert_eq!(Release::parse("1.5.1.RELEASE").map(|r| r.triple()), Some((1, 5, 1)));
        assert_eq!(Release::parse("2").map(|r| r.triple()), Some((2, 0, 0)));
        assert!(Release::parse("28.2-jre").is_none());
        assert!(Release::parse("1.0.0-SNAPSHOT").is_none());
    }

    #[test]
    fn test_selector_dispatch() {
        assert!(matches!(Semver::parse("latest.release"), Ok(Comparator::Latest(_))));
        assert!(matches!(Semver::parse("1.x"), Ok(Comparator::X(_))));
        assert!(matches!(Semver::parse("~1.5"), Ok(Comparator::Tilde(_))));
        assert!(matches!(Semver::parse("1 - 2"), Ok(Comparator::Hyphen(_))));
        assert!(Semver::validate("banana").is_invalid());
        assert!(Semver::comparator("1.x.0").is_err());
    }

    #[test]
    fn test_upgrade_picks_newest_accepted() {
        let tilde = TildeRange::build("~1.5").unwrap();
        let available = [
            "1.4.9.RELEASE",
            "1.5.1.RELEASE",
            "1.5.9.RELEASE",
            "1.5.22.RELEASE",
            "1.6.0.RELEASE",
            "2.0.0.RELEASE",
        ];
        assert_eq!(tilde.upgrade("1.5.1.RELEASE", available), Some("1.5.22.RELEASE"));
        assert_eq!(tilde.upgrade("1.5.22.RELEASE", available), None);
    }
}
