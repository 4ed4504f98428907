//! Where listings and issue content come from.
//!
//! [`HttpSource`] talks to an issue server over `ureq`; [`DirSource`] reads
//! Markdown files from `<dir>/<owner>/<repo>/<number>.md` and cannot accept
//! submissions.

use anyhow::{Context, Result, bail};
use cairn_core::IssueKey;
use cairn_core::config::ServerConfig;
use cairn_core::error::FetchError;
use cairn_core::form::{FormKind, IssueForm, SubmitResponse, classify_response};
use cairn_core::model::listing::Listing;
use cairn_core::surface::FetchRequest;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Line separating an issue's description from its comments and events.
const DETAILS_SEPARATOR: &str = "---";

/// Backend serving issue content and accepting form submissions.
pub trait ContentSource: Send + Sync {
    /// Markdown for one issue.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the content cannot be produced.
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;

    /// Submit a create, edit or comment form.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failure or for read-only sources.
    fn submit(&self, form: &IssueForm) -> Result<SubmitResponse, FetchError>;

    /// Short description for the status bar.
    fn describe(&self) -> String;
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// `scheme://host[:port]` of `url`.
fn origin(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let host_len = rest.find('/').unwrap_or(rest.len());
    let end = url.len() - rest.len() + host_len;
    Some(&url[..end])
}

/// Substitute `{repository}` and `{number}` in a path template.
fn expand(template: &str, key: &IssueKey) -> String {
    template
        .replace("{repository}", &key.repository)
        .replace("{number}", &key.number.to_string())
}

fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Load a listing from a file path or an `http(s)` URL.
///
/// # Errors
///
/// Returns an error naming the location when it cannot be read or parsed.
pub fn load_listing(location: &str, timeout: Duration) -> Result<Listing> {
    let listing = if is_url(location) {
        let body = agent(timeout)
            .get(location)
            .set("Accept", "application/json")
            .call()
            .map_err(|err| transport_error(location, err))
            .and_then(|response| {
                response
                    .into_string()
                    .map_err(|err| FetchError::Transport(err.to_string()))
            })
            .with_context(|| format!("Failed to fetch listing {location}"))?;
        Listing::from_json(&body).with_context(|| format!("Failed to parse listing {location}"))?
    } else {
        Listing::load(Path::new(location))
            .with_context(|| format!("Failed to load listing {location}"))?
    };
    info!(
        location,
        boards = listing.boards.len(),
        items = listing.item_count(),
        "listing loaded"
    );
    Ok(listing)
}

fn transport_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(status, _) => FetchError::Status {
            status,
            url: url.to_string(),
        },
        ureq::Error::Transport(transport) => FetchError::Transport(transport.to_string()),
    }
}

/// Pick the content source for a session.
///
/// `server.base_url` wins, then `server.content_dir`. Otherwise a URL
/// listing is served by its own origin and a file listing by its directory.
///
/// # Errors
///
/// Returns an error when no source can be derived.
pub fn source_for(server: &ServerConfig, listing: &str) -> Result<Box<dyn ContentSource>> {
    if let Some(base_url) = &server.base_url {
        return Ok(Box::new(HttpSource::new(base_url, server)));
    }
    if let Some(dir) = &server.content_dir {
        return Ok(Box::new(DirSource::new(dir.clone())));
    }
    if is_url(listing) {
        let Some(base) = origin(listing) else {
            bail!("Cannot derive a server from {listing}; set server.base_url");
        };
        return Ok(Box::new(HttpSource::new(base, server)));
    }
    let dir = Path::new(listing)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok(Box::new(DirSource::new(dir)))
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

pub struct HttpSource {
    agent: ureq::Agent,
    base_url: String,
    server: ServerConfig,
}

impl HttpSource {
    pub fn new(base_url: &str, server: &ServerConfig) -> Self {
        Self {
            agent: agent(server.timeout()),
            base_url: base_url.trim_end_matches('/').to_string(),
            server: server.clone(),
        }
    }

    fn detail_url(&self, request: &FetchRequest) -> String {
        let mut url = format!(
            "{}{}",
            self.base_url,
            expand(&self.server.detail_path, &request.key)
        );
        if request.verbose {
            url.push_str("?verbose=1");
        }
        url
    }

    fn submit_url(&self, form: &IssueForm) -> String {
        let template = match form.kind {
            FormKind::Create => &self.server.create_path,
            FormKind::Edit => &self.server.edit_path,
            FormKind::Comment => &self.server.comment_path,
        };
        format!("{}{}", self.base_url, expand(template, &form.target))
    }
}

impl ContentSource for HttpSource {
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let url = self.detail_url(request);
        debug!(%url, ticket = request.ticket, "fetching issue");
        let response = self
            .agent
            .get(&url)
            .set("Accept", "text/markdown")
            .call()
            .map_err(|err| transport_error(&url, err))?;
        response
            .into_string()
            .map_err(|err| FetchError::Transport(err.to_string()))
    }

    fn submit(&self, form: &IssueForm) -> Result<SubmitResponse, FetchError> {
        let pairs = match form.encode() {
            Ok(pairs) => pairs,
            Err(errors) => {
                return Ok(SubmitResponse::Form {
                    errors: errors.iter().map(ToString::to_string).collect(),
                });
            }
        };
        let url = self.submit_url(form);
        debug!(%url, kind = ?form.kind, target = %form.target, "submitting form");
        let fields: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let body = match self.agent.post(&url).send_form(&fields) {
            Ok(response) => response.into_string(),
            // A rejected form comes back with an error status and the form body.
            Err(ureq::Error::Status(status, response)) => {
                debug!(status, "submission answered with error status");
                response.into_string()
            }
            Err(err) => return Err(transport_error(&url, err)),
        }
        .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(classify_response(&body))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ---------------------------------------------------------------------------
// Local directory
// ---------------------------------------------------------------------------

pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `<root>/<owner>/<repo>/<number>.md`, refusing paths that escape `root`.
    fn path_for(&self, key: &IssueKey) -> Option<PathBuf> {
        let repo = Path::new(&key.repository);
        let safe = repo
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || key.repository.is_empty() {
            return None;
        }
        Some(self.root.join(repo).join(format!("{}.md", key.number)))
    }
}

/// Drop everything from the first separator line on.
fn compact(content: &str) -> String {
    let mut out = String::new();
    for line in content.lines() {
        if line.trim_end() == DETAILS_SEPARATOR {
            break;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

impl ContentSource for DirSource {
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let Some(path) = self.path_for(&request.key) else {
            return Err(FetchError::NotFound(request.key.to_string()));
        };
        match fs::read_to_string(&path) {
            Ok(content) if request.verbose => Ok(content),
            Ok(content) => Ok(compact(&content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(request.key.to_string()))
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read issue file");
                Err(FetchError::Transport(err.to_string()))
            }
        }
    }

    fn submit(&self, _form: &IssueForm) -> Result<SubmitResponse, FetchError> {
        Err(FetchError::ReadOnly)
    }

    fn describe(&self) -> String {
        format!("{} (read-only)", self.root.display())
    }
}
