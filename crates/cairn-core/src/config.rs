//! Layered TOML configuration.
//!
//! The user file (`<config_dir>/cairn/config.toml`) is read first, then the
//! project file (`.cairn/config.toml`) is merged over it key by key.
//! `CAIRN_BASE_URL` finally overrides `server.base_url`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PROJECT_CONFIG_PATH: &str = ".cairn/config.toml";
pub const BASE_URL_ENV: &str = "CAIRN_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_detail_path")]
    pub detail_path: String,
    #[serde(default = "default_create_path")]
    pub create_path: String,
    #[serde(default = "default_edit_path")]
    pub edit_path: String,
    #[serde(default = "default_comment_path")]
    pub comment_path: String,
    /// Read-only local content: `<dir>/<owner>/<repo>/<number>.md`.
    #[serde(default)]
    pub content_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            detail_path: default_detail_path(),
            create_path: default_create_path(),
            edit_path: default_edit_path(),
            comment_path: default_comment_path(),
            content_dir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub fuzzy: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            fuzzy: false,
        }
    }
}

impl FilterConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub inline_detail: bool,
    /// Width of the board column as a percentage of the screen.
    #[serde(default = "default_split_percent")]
    pub split_percent: u16,
    #[serde(default = "default_open_ticks")]
    pub open_ticks: u8,
    /// Repository assumed by "go to issue" when none is given.
    #[serde(default)]
    pub default_repository: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            inline_detail: default_true(),
            split_percent: default_split_percent(),
            open_ticks: default_open_ticks(),
            default_repository: None,
        }
    }
}

/// Path of the user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cairn/config.toml"))
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table = content
        .parse::<toml::Table>()
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(table))
}

/// Merge `over` into `base`, recursing into sub-tables.
fn merge_tables(base: &mut toml::Table, over: toml::Table) {
    for (key, value) in over {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Load config from an explicit user file and project root.
///
/// # Errors
///
/// Returns an error naming the file when either file cannot be read or
/// does not describe a valid config.
pub fn load_config_from(user_path: Option<&Path>, project_root: &Path) -> Result<Config> {
    let mut merged = toml::Table::new();
    let mut sources = Vec::new();
    if let Some(path) = user_path
        && let Some(table) = read_table(path)?
    {
        merge_tables(&mut merged, table);
        sources.push(path.to_path_buf());
    }
    let project_path = project_root.join(PROJECT_CONFIG_PATH);
    if let Some(table) = read_table(&project_path)? {
        merge_tables(&mut merged, table);
        sources.push(project_path);
    }

    let config = Config::deserialize(toml::Value::Table(merged)).with_context(|| {
        let names: Vec<String> = sources.iter().map(|p| p.display().to_string()).collect();
        format!("Failed to parse {}", names.join(", "))
    })?;
    tracing::debug!(sources = sources.len(), "config loaded");
    Ok(config)
}

/// Load the effective config for `project_root`, including env overrides.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config(project_root: &Path) -> Result<Config> {
    let user = user_config_path();
    let mut config = load_config_from(user.as_deref(), project_root)?;
    config.apply_env(std::env::var(BASE_URL_ENV).ok());
    Ok(config)
}

impl Config {
    /// Apply a `CAIRN_BASE_URL` value; blank values are ignored.
    pub fn apply_env(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.server.base_url = Some(url.trim().to_string());
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_detail_path() -> String {
    "/{repository}/issues/{number}/".to_string()
}

fn default_create_path() -> String {
    "/{repository}/issues/new/".to_string()
}

fn default_edit_path() -> String {
    "/{repository}/issues/{number}/edit/".to_string()
}

fn default_comment_path() -> String {
    "/{repository}/issues/{number}/comment/".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_debounce_ms() -> u64 {
    300
}

const fn default_split_percent() -> u16 {
    45
}

const fn default_open_ticks() -> u8 {
    3
}
