//! Accumulating validation of visitor options

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RemoldError;
use crate::result::Result;

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalid {
    pub property: String,
    pub value: Option<String>,
    pub message: String,
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} '{}' {}", self.property, value, self.message),
            None => write!(f, "{} {}", self.property, self.message),
        }
    }
}

/// Outcome of zero or more checks
///
/// `Validated::none()` means nothing was checked and counts as valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validated {
    failures: Vec<Invalid>,
}

impl Validated {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn valid() -> Self {
        Self::default()
    }

    pub fn invalid(property: &str, value: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            failures: vec![Invalid {
                property: property.to_string(),
                value: value.map(str::to_string),
                message: message.into(),
            }],
        }
    }

    /// Fails when `value` is absent
    pub fn required(property: &str, value: Option<&str>) -> Self {
        match value {
            Some(_) => Self::valid(),
            None => Self::invalid(property, None, "is required"),
        }
    }

    /// Fails when `value` is absent or only whitespace
    pub fn not_blank(property: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self::valid(),
            _ => Self::invalid(property, value, "must not be blank"),
        }
    }

    /// Fails when `test` rejects `value`; `{}` in the message is replaced by the value
    pub fn test(property: &str, message: &str, value: &str, test: impl FnOnce(&str) -> bool) -> Self {
        if test(value) {
            Self::valid()
        } else {
            Self::invalid(property, Some(value), message.replace("{}", value))
        }
    }

    /// Valid only if both are valid
    pub fn and(mut self, other: Validated) -> Self {
        self.failures.extend(other.failures);
        self
    }

    /// Valid if either is valid
    pub fn or(self, other: Validated) -> Self {
        if self.is_valid() || other.is_valid() {
            Self::valid()
        } else {
            self.and(other)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    pub fn failures(&self) -> &[Invalid] {
        &self.failures
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(RemoldError::Validation {
                failures: self.failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_combination() {
        let v = Validated::required("groupId", Some("com.google"))
            .and(Validated::required("toVersion", None));
        assert!(v.is_invalid());
        assert_eq!(v.failures().len(), 1);
        assert_eq!(v.failures()[0].to_string(), "toVersion is required");
    }

    #[test]
    fn test_message_placeholder() {
        let v = Validated::test("count", "{} is not positive", "-1", |s| !s.starts_with('-'));
        assert_eq!(v.failures()[0].message, "-1 is not positive");
    }

    #[test]
    fn test_or_and_into_result() {
        let bad = || Validated::invalid("a", None, "bad");
        assert!(bad().or(Validated::none()).is_valid());
        assert_eq!(bad().or(bad()).failures().len(), 2);
        let err = bad().into_result().unwrap_err();
        assert!(err.to_string().contains("a bad"));
    }
}
