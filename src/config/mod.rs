//! Configuration management.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`JIM_*`)
//! 3. Config file (`jim.yaml` in the working directory, or `--config`)
//! 4. Defaults
//!
//! All tunables the pipeline consults live here and are passed into each
//! component by reference; nothing reads configuration ambiently.

use crate::error::{JimError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config filename searched in the working directory.
const CONFIG_FILENAME: &str = "jim.yaml";

/// Resolved migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigrationConfig {
    /// Base URL of the source tracker (search endpoint and attachments).
    pub source_base_url: String,
    /// Human-readable source name used in audit comments.
    pub source_name: String,
    /// Base URL of the destination REST API.
    pub dest_api_url: String,
    /// Base URL of the destination web UI, used for cross-issue links.
    pub dest_web_url: String,
    /// Ordinals fetched concurrently per batch.
    pub batch_size: u64,
    /// Fixed pacing delay before destination requests, in milliseconds.
    pub request_delay_ms: u64,
    /// Per-issue polling budget, in seconds.
    pub poll_timeout_secs: u64,
    /// Delay between consecutive polls of one job, in milliseconds.
    pub poll_interval_ms: u64,
    /// HTTP request timeout, in seconds.
    pub http_timeout_secs: u64,
    /// Maximum body/comment length accepted by the importer, in characters.
    pub body_limit: usize,
    /// Status names (matched case-insensitively) that mean "closed".
    pub terminal_statuses: Vec<String>,
    /// Error resource kinds on a failed import job that are retried.
    pub transient_error_resources: Vec<String>,
    /// Permission granted to created collaborators.
    pub collaborator_permission: String,
    /// Id of the custom field whose values become labels.
    pub custom_tag_field: String,
    /// Directory holding checkpoint snapshots.
    pub state_dir: PathBuf,
    /// User-Agent header sent to both trackers.
    pub user_agent: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source_base_url: "https://java.net/jira".to_string(),
            source_name: "java.net JIRA".to_string(),
            dest_api_url: "https://api.github.com".to_string(),
            dest_web_url: "https://github.com".to_string(),
            batch_size: 50,
            request_delay_ms: 500,
            poll_timeout_secs: 120,
            poll_interval_ms: 1000,
            http_timeout_secs: 60,
            body_limit: 65536,
            terminal_statuses: vec!["closed".to_string(), "resolved".to_string()],
            transient_error_resources: vec!["Internal Error".to_string()],
            collaborator_permission: "pull".to_string(),
            custom_tag_field: "customfield_10002".to_string(),
            state_dir: PathBuf::from(".jim"),
            user_agent: concat!("jim_rust/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// CLI-level overrides applied on top of file and environment values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source_base_url: Option<String>,
    pub batch_size: Option<u64>,
    pub state_dir: Option<PathBuf>,
}

impl MigrationConfig {
    /// Load configuration with full precedence applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given config file is missing, or
    /// if any config file cannot be parsed.
    pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(JimError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(CONFIG_FILENAME);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env();
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn apply_env(&mut self) {
        if let Some(value) = non_empty_env("JIM_SOURCE_URL") {
            self.source_base_url = value;
        }
        if let Some(value) = non_empty_env("JIM_DEST_API_URL") {
            self.dest_api_url = value;
        }
        if let Some(value) = non_empty_env("JIM_STATE_DIR") {
            self.state_dir = PathBuf::from(value);
        }
        if let Some(value) = non_empty_env("JIM_BATCH_SIZE") {
            if let Ok(parsed) = value.parse() {
                self.batch_size = parsed;
            }
        }
    }

    fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(url) = &overrides.source_base_url {
            self.source_base_url = url.clone();
        }
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(state_dir) = &overrides.state_dir {
            self.state_dir = state_dir.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(JimError::Config("batch_size must be positive".to_string()));
        }
        if self.body_limit == 0 {
            return Err(JimError::Config("body_limit must be positive".to_string()));
        }
        if self.terminal_statuses.is_empty() {
            return Err(JimError::Config(
                "terminal_statuses cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Lowercased terminal status names for case-insensitive matching.
    #[must_use]
    pub fn terminal_statuses_lowercase(&self) -> Vec<String> {
        self.terminal_statuses
            .iter()
            .map(|s| s.to_lowercase())
            .collect()
    }

    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// Load the optional username mapping file.
///
/// Each non-empty line holds `<source identity> <destination login>`
/// separated by whitespace. A missing file yields an empty map.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, or a line has
/// the wrong shape.
pub fn load_username_map(path: Option<&Path>) -> Result<HashMap<String, String>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let contents = fs::read_to_string(path)?;
    let mut map = HashMap::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(source), Some(dest), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(JimError::Config(format!(
                "malformed username map line {}: '{line}'",
                index + 1
            )));
        };
        map.insert(source.to_string(), dest.to_string());
    }
    Ok(map)
}
