//! Composite issue identity.

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one issue: `(number, repository)`.
///
/// Unique across every board of a session. [`IssueKey::empty`] (`(0, "")`)
/// is the identity of a surface that displays nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueKey {
    pub number: u64,
    pub repository: String,
}

impl IssueKey {
    pub fn new(number: u64, repository: impl Into<String>) -> Self {
        Self {
            number,
            repository: repository.into(),
        }
    }

    /// The "nothing displayed" sentinel.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            number: 0,
            repository: String::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.number == 0 && self.repository.is_empty()
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        write!(f, "{}#{}", self.repository, self.number)
    }
}

/// Error parsing an `owner/repo#42` reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid issue reference '{input}': expected owner/repo#NUMBER")]
pub struct KeyParseError {
    pub input: String,
}

impl KeyParseError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidIssueKey
    }
}

impl FromStr for IssueKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || KeyParseError {
            input: s.to_string(),
        };
        let (repository, number) = s.trim().rsplit_once('#').ok_or_else(err)?;
        let number: u64 = number.parse().map_err(|_| err())?;
        if number == 0 || repository.is_empty() || !repository.contains('/') {
            return Err(err());
        }
        Ok(Self::new(number, repository))
    }
}
