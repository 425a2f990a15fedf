//! Test identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated test identifier.
///
/// Test ids are interpolated into request paths, so they must be a single
/// non-empty path segment.
///
/// # Example
///
/// ```
/// use quizgate_core::TestId;
///
/// let id = TestId::new("42").unwrap();
/// assert_eq!(id.as_str(), "42");
/// assert!(TestId::new("../admin").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestId(String);

impl TestId {
    /// Create a new test id, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::TestId {
                value: s.to_string(),
                reason: "must be non-empty".to_string(),
            }
            .into());
        }

        if s == "." || s == ".." {
            return Err(InvalidInputError::TestId {
                value: s.to_string(),
                reason: "must not be a relative path segment".to_string(),
            }
            .into());
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(InvalidInputError::TestId {
                value: s.to_string(),
                reason: "must contain only letters, digits, '-', '_' or '.'".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TestId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TestId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TestId> for String {
    fn from(id: TestId) -> Self {
        id.0
    }
}

impl From<u64> for TestId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}
