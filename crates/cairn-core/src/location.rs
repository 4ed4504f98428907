//! Initial-selection locations and the "go to issue" prompt.

use crate::IssueKey;
use crate::error::ErrorCode;

/// Issue to select when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialSelection {
    pub number: u64,
    pub repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("enter an issue number")]
    Empty,

    #[error("'{0}' is not an issue number")]
    NotANumber(String),

    #[error("issue numbers start at 1")]
    Zero,

    #[error("unrecognized location '{0}': expected #issue-N or /owner/repo/issues/N/")]
    UnrecognizedLocation(String),
}

impl LookupError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Empty | Self::NotANumber(_) | Self::Zero => ErrorCode::InvalidIssueNumber,
            Self::UnrecognizedLocation(_) => ErrorCode::InvalidIssueKey,
        }
    }
}

/// Validate the text typed into the "go to issue" prompt.
///
/// A leading `#` is accepted.
///
/// # Errors
///
/// Returns a [`LookupError`] for blank, non-numeric or zero input.
pub fn parse_issue_number(input: &str) -> Result<u64, LookupError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if digits.is_empty() {
        return Err(LookupError::Empty);
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(LookupError::NotANumber(trimmed.to_string()));
    }
    match digits.parse::<u64>() {
        Ok(0) => Err(LookupError::Zero),
        Ok(n) => Ok(n),
        Err(_) => Err(LookupError::NotANumber(trimmed.to_string())),
    }
}

/// Parse an initial-selection location.
///
/// Accepted forms: `#issue-12`, `/owner/repo/issues/12/`, `/issues/12/`,
/// `owner/repo#12`, and full URLs ending in any of the path forms. A
/// `#issue-N` fragment wins over the path.
///
/// # Errors
///
/// Returns [`LookupError::UnrecognizedLocation`] for anything else, or the
/// number error when the number itself is invalid.
pub fn parse_location(input: &str) -> Result<InitialSelection, LookupError> {
    let input = input.trim();
    let unrecognized = || LookupError::UnrecognizedLocation(input.to_string());

    let (before, fragment) = match input.split_once('#') {
        Some((before, fragment)) => (before, Some(fragment)),
        None => (input, None),
    };

    if let Some(number) = fragment.and_then(|f| f.strip_prefix("issue-")) {
        let number = parse_issue_number(number)?;
        let repository = path_selection(strip_origin(before)).and_then(|s| s.repository);
        return Ok(InitialSelection { number, repository });
    }

    if let Ok(key) = input.parse::<IssueKey>() {
        return Ok(InitialSelection {
            number: key.number,
            repository: Some(key.repository),
        });
    }

    path_selection(strip_origin(before)).ok_or_else(unrecognized)
}

fn strip_origin(input: &str) -> &str {
    let Some((_, rest)) = input.split_once("://") else {
        return input;
    };
    rest.find('/').map_or("", |idx| &rest[idx..])
}

fn path_selection(path: &str) -> Option<InitialSelection> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let issues_at = segments.iter().rposition(|s| *s == "issues")?;
    let number = parse_issue_number(segments.get(issues_at + 1)?).ok()?;
    let repository = match issues_at {
        2.. => Some(format!(
            "{}/{}",
            segments[issues_at - 2],
            segments[issues_at - 1]
        )),
        _ => None,
    };
    Some(InitialSelection { number, repository })
}
