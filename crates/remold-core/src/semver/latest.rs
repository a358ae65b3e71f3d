use std::cmp::Ordering;

use super::{Release, VersionComparator, invalid};
use crate::validated::Invalid;

/// Accepts any release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatestRelease;

impl LatestRelease {
    pub fn build(pattern: &str) -> Result<Self, Invalid> {
        if pattern == "latest.release" {
            Ok(LatestRelease)
        } else {
            Err(invalid("latest release", pattern))
        }
    }
}

impl VersionComparator for LatestRelease {
    fn is_valid(&self, version: &str) -> bool {
        Release::parse(version).is_some()
    }

    /// Segment by segment, a missing segment sorting first; ties fall back to the text
    fn compare(&self, v1: &str, v2: &str) -> Ordering {
        let (Some(a), Some(b)) = (Release::parse(v1), Release::parse(v2)) else {
            return v1.cmp(v2);
        };
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            .then_with(|| v1.cmp(v2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        let latest = LatestRelease;
        assert_eq!(latest.compare("1.5.9.RELEASE", "1.5.22.RELEASE"), Ordering::Less);
        assert_eq!(latest.compare("1.10", "1.9.9"), Ordering::Greater);
        assert_eq!(latest.compare("1", "1.0"), Ordering::Less);
        assert_eq!(latest.compare("2.0.0", "2.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_only_releases_are_valid() {
        assert!(LatestRelease.is_valid("1.5.22.RELEASE"));
        assert!(!LatestRelease.is_valid("1.6.0-M1"));
        assert!(LatestRelease::build("latest.integration").is_err());
    }
}
