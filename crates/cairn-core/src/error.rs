use std::fmt;

/// Machine-readable error codes for scripts and agents driving `cairn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ListingParseError,
    ConfigParseError,
    ListingInvalid,
    ItemNotFound,
    InvalidIssueNumber,
    InvalidFieldValue,
    InvalidIssueKey,
    FetchFailed,
    FetchStatus,
    FormRejected,
    ReadOnlySource,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ListingParseError => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ListingInvalid => "E1003",
            Self::ItemNotFound => "E2001",
            Self::InvalidIssueNumber => "E2002",
            Self::InvalidFieldValue => "E2003",
            Self::InvalidIssueKey => "E2004",
            Self::FetchFailed => "E3001",
            Self::FetchStatus => "E3002",
            Self::FormRejected => "E3003",
            Self::ReadOnlySource => "E3004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ListingParseError => "Listing parse error",
            Self::ConfigParseError => "Config file parse error",
            Self::ListingInvalid => "Listing is inconsistent",
            Self::ItemNotFound => "Issue not found",
            Self::InvalidIssueNumber => "Invalid issue number",
            Self::InvalidFieldValue => "Invalid form field value",
            Self::InvalidIssueKey => "Invalid issue reference",
            Self::FetchFailed => "Content request failed",
            Self::FetchStatus => "Server returned an error status",
            Self::FormRejected => "Form was rejected by the server",
            Self::ReadOnlySource => "Content source is read-only",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ListingParseError => Some("Check the listing is valid JSON with a `boards` array."),
            Self::ConfigParseError => Some("Fix syntax in .cairn/config.toml and retry."),
            Self::ListingInvalid => {
                Some("Every issue needs a repository and a unique (number, repository) pair.")
            }
            Self::ItemNotFound => None,
            Self::InvalidIssueNumber => Some("Enter digits only, e.g. `42`."),
            Self::InvalidFieldValue => Some("Correct the highlighted field and submit again."),
            Self::InvalidIssueKey => Some("Use the form `owner/repo#42`."),
            Self::FetchFailed => Some("Check `server.base_url` and your network, then reopen the issue."),
            Self::FetchStatus => Some("Reopen the issue to retry; the server may be unavailable."),
            Self::FormRejected => Some("Fix the reported fields and submit again."),
            Self::ReadOnlySource => {
                Some("Configure `server.base_url` to create, edit or comment on issues.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure while fetching or submitting issue content.
///
/// Cloneable so a completion can be both logged and handed to the surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("server returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Connection, DNS, timeout or body decoding failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// A local content source has no file for the issue.
    #[error("no content for {0}")]
    NotFound(String),

    /// The content source cannot accept submissions.
    #[error("content source is read-only")]
    ReadOnly,
}

impl FetchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Status { .. } => ErrorCode::FetchStatus,
            Self::Transport(_) => ErrorCode::FetchFailed,
            Self::NotFound(_) => ErrorCode::ItemNotFound,
            Self::ReadOnly => ErrorCode::ReadOnlySource,
        }
    }
}
