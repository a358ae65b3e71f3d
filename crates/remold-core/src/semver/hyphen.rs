use std::sync::LazyLock;

use regex::Regex;

use super::{Release, VersionComparator, invalid, segments};
use crate::validated::Invalid;

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?\s+-\s+(\d+)(?:\.(\d+))?(?:\.(\d+))?$").unwrap()
});

/// Inclusive range such as `1.2.3 - 2.3.4`
///
/// A partial upper bound accepts everything it names: `1.2 - 2.3` is
/// `>=1.2.0 <2.4.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyphenRange {
    lower: (u64, u64, u64),
    upper: (u64, u64, u64),
    upper_inclusive: bool,
}

impl HyphenRange {
    pub fn build(pattern: &str) -> Result<Self, Invalid> {
        let fail = || invalid("hyphen range", pattern);
        let caps = PATTERN.captures(pattern).ok_or_else(fail)?;
        let lower = segments(&caps, 1).ok_or_else(fail)?;
        let upper = segments(&caps, 4).ok_or_else(fail)?;
        let (upper, upper_inclusive) = match (upper.minor, upper.patch) {
            (Some(_), Some(_)) => (upper.triple(), true),
            (Some(minor), None) => ((upper.major, minor + 1, 0), false),
            (None, _) => ((upper.major + 1, 0, 0), false),
        };
        Ok(Self {
            lower: lower.triple(),
            upper,
            upper_inclusive,
        })
    }
}

impl VersionComparator for HyphenRange {
    fn is_valid(&self, version: &str) -> bool {
        Release::parse(version).map(|r| r.triple()).is_some_and(|v| {
            self.lower <= v
                && if self.upper_inclusive {
                    v <= self.upper
                } else {
                    v < self.upper
                }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_bounds_are_inclusive() {
        let range = HyphenRange::build("1.2.3 - 2.3.4").unwrap();
        assert!(range.is_valid("1.2.3"));
        assert!(range.is_valid("2.3.4"));
        assert!(!range.is_valid("2.3.5"));
        assert!(!range.is_valid("1.2.2"));
    }

    #[test]
    fn test_partial_bounds() {
        let range = HyphenRange::build("1.2 - 2.3").unwrap();
        assert!(range.is_valid("1.2.0"));
        assert!(range.is_valid("2.3.9"));
        assert!(!range.is_valid("2.4.0"));
        assert!(HyphenRange::build("1.2").is_err());
    }
}
