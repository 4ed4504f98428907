//! Board listing document.
//!
//! The listing is the JSON description of every board a session shows:
//!
//! ```text
//! { "boards": [
//!     { "name": "Open", "filter": true, "groups": [
//!         { "title": "acme/api - open", "repository": "acme/api",
//!           "collapsible": true, "collapsed": false,
//!           "items": [ { "number": 12, "title": "Crash on start" } ] } ] } ] }
//! ```
//!
//! Items inherit the group repository when they do not name one. The
//! document is validated when the entity tree is built from it.

use crate::IssueKey;
use crate::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while reading or validating a listing.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// The listing file could not be read.
    #[error("failed to read listing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not a valid listing.
    #[error("listing parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An item has no repository and its group names none either.
    #[error("issue #{number} in group '{group}' has no repository")]
    MissingRepository { number: u64, group: String },

    /// Issue number `0` is reserved for the empty surface identity.
    #[error("group '{group}' contains an issue numbered 0")]
    ReservedNumber { group: String },

    /// The same `(number, repository)` appears twice.
    #[error("issue {0} appears more than once in the listing")]
    DuplicateItem(IssueKey),
}

impl ListingError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Parse(_) => ErrorCode::ListingParseError,
            Self::MissingRepository { .. } | Self::ReservedNumber { .. } | Self::DuplicateItem(_) => {
                ErrorCode::ListingInvalid
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub boards: Vec<BoardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardEntry {
    pub name: String,
    /// Whether the board carries a filter input.
    #[serde(default)]
    pub filter: bool,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub title: String,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default = "default_true")]
    pub collapsible: bool,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub number: u64,
    #[serde(default)]
    pub repository: Option<String>,
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Extra text indexed by the filter but never displayed.
    #[serde(default)]
    pub search: Option<String>,
}

impl ItemEntry {
    /// Resolve the item identity, falling back to the group repository.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::MissingRepository`] or
    /// [`ListingError::ReservedNumber`] when no valid identity exists.
    pub fn key(&self, group: &GroupEntry) -> Result<IssueKey, ListingError> {
        if self.number == 0 {
            return Err(ListingError::ReservedNumber {
                group: group.title.clone(),
            });
        }
        let repository = self
            .repository
            .as_deref()
            .or(group.repository.as_deref())
            .filter(|repo| !repo.trim().is_empty())
            .ok_or_else(|| ListingError::MissingRepository {
                number: self.number,
                group: group.title.clone(),
            })?;
        Ok(IssueKey::new(self.number, repository.trim()))
    }
}

impl Listing {
    /// Parse a listing from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Parse`] if the text is not a listing.
    pub fn from_json(text: &str) -> Result<Self, ListingError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a listing file.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Io`] if the file cannot be read, or a parse error.
    pub fn load(path: &Path) -> Result<Self, ListingError> {
        let text = std::fs::read_to_string(path).map_err(|source| ListingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Total number of items across every board.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.boards
            .iter()
            .flat_map(|board| &board.groups)
            .map(|group| group.items.len())
            .sum()
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "boards": [{
            "name": "Open",
            "filter": true,
            "groups": [{
                "title": "acme/api - open",
                "repository": "acme/api",
                "items": [
                    {"number": 1, "title": "Crash on start", "labels": ["bug"]},
                    {"number": 7, "repository": "acme/web", "title": "Button misaligned",
                     "updated_at": "2026-09-30T12:00:00Z"}
                ]
            }]
        }]
    }"#;

    #[test]
    fn parses_defaults() {
        let listing = Listing::from_json(SAMPLE).expect("parse");
        let group = &listing.boards[0].groups[0];
        assert!(listing.boards[0].filter);
        assert!(group.collapsible);
        assert!(!group.collapsed);
        assert_eq!(listing.item_count(), 2);
        assert!(group.items[1].updated_at.is_some());
    }

    #[test]
    fn item_key_inherits_group_repository() {
        let listing = Listing::from_json(SAMPLE).expect("parse");
        let group = &listing.boards[0].groups[0];
        assert_eq!(
            group.items[0].key(group).expect("key"),
            IssueKey::new(1, "acme/api")
        );
        assert_eq!(
            group.items[1].key(group).expect("key"),
            IssueKey::new(7, "acme/web")
        );
    }

    #[test]
    fn item_without_any_repository_is_rejected() {
        let listing = Listing::from_json(
            r#"{"boards":[{"name":"b","groups":[{"title":"g","items":[{"number":3,"title":"t"}]}]}]}"#,
        )
        .expect("parse");
        let group = &listing.boards[0].groups[0];
        let err = group.items[0].key(group).expect_err("missing repo");
        assert!(matches!(err, ListingError::MissingRepository { number: 3, .. }));
        assert_eq!(err.code(), ErrorCode::ListingInvalid);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Listing::from_json("{\"boards\": 3}").expect_err("bad");
        assert_eq!(err.code(), ErrorCode::ListingParseError);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.json");
        let err = Listing::load(&path).expect_err("missing");
        assert!(err.to_string().contains("nope.json"));
    }
}
