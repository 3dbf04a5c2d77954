//! Configuration settings and validation.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Placeholder token shipped in sample configs; treated as unset.
const PLACEHOLDER_TOKEN: &str = "YOUR_PLEX_TOKEN_HERE";

/// File name fragments of in-progress downloads and temp files.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".partial~", ".tmp", ".temp", ".downloading"];

/// A local directory to monitor and the library title expected to back it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WatchPath {
    /// Directory path, compared verbatim against library locations.
    pub path: String,
    /// Title of the library the path should belong to.
    pub expected_title: String,
}

impl WatchPath {
    /// Create a new watch path.
    pub fn new(path: impl Into<String>, expected_title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected_title: expected_title.into(),
        }
    }
}

impl fmt::Display for WatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (expecting library: {})", self.path, self.expected_title)
    }
}

impl FromStr for WatchPath {
    type Err = Error;

    /// Parse `PATH=TITLE`. The split happens on the last `=` so paths may
    /// contain one.
    fn from_str(s: &str) -> Result<Self> {
        let (path, title) = s
            .rsplit_once('=')
            .ok_or_else(|| Error::config(format!("watch entry '{s}' must be PATH=TITLE")))?;
        let path = path.trim();
        let title = title.trim();
        if path.is_empty() || title.is_empty() {
            return Err(Error::config(format!("watch entry '{s}' has an empty path or title")));
        }
        Ok(Self::new(path, title))
    }
}

/// When a changed path's stored signature moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// Every scanned signature is persisted, whatever the trigger outcome.
    #[default]
    Always,
    /// A changed path keeps its old baseline until its trigger succeeds.
    OnSuccess,
}

/// Main configuration for plexwatch.
#[derive(Clone)]
pub struct Config {
    /// Base address of the Plex server.
    pub server_url: String,

    /// `X-Plex-Token` sent with every request.
    pub token: Option<String>,

    /// Seconds between poll cycles.
    pub interval_secs: u64,

    /// Directories to monitor.
    pub watch_paths: Vec<WatchPath>,

    /// File name substrings excluded from change detection.
    pub ignore_patterns: Vec<String>,

    /// Where per-path signatures are persisted between runs.
    pub state_file: PathBuf,

    /// Optional log file, in addition to the console.
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines.
    pub log_json: bool,

    /// Upper bound on each remote request, in seconds.
    pub request_timeout_secs: u64,

    /// Baseline advancement rule for failed triggers.
    pub advance_policy: AdvancePolicy,

    /// Listen address for `/health` and `/metrics`; disabled when `None`.
    pub metrics_addr: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("has_token", &self.token.is_some())
            .field("interval_secs", &self.interval_secs)
            .field("watch_paths", &self.watch_paths)
            .field("ignore_patterns", &self.ignore_patterns)
            .field("state_file", &self.state_file)
            .field("log_file", &self.log_file)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("advance_policy", &self.advance_policy)
            .field("metrics_addr", &self.metrics_addr)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:32400".to_string(),
            token: None,
            interval_secs: 60,
            watch_paths: Vec::new(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            state_file: PathBuf::from("/tmp/plexwatch_state.json"),
            log_file: None,
            log_level: "info".to_string(),
            log_json: false,
            request_timeout_secs: 30,
            advance_policy: AdvancePolicy::Always,
            metrics_addr: None,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.token.as_deref().map(str::trim) {
            None | Some("" | PLACEHOLDER_TOKEN) => {
                return Err(Error::config(
                    "Plex token is not set (see 'Finding an authentication token / X-Plex-Token' in the Plex docs)",
                ));
            }
            Some(_) => {}
        }

        if self.watch_paths.is_empty() {
            return Err(Error::config("no watch paths configured"));
        }

        let mut seen = std::collections::BTreeSet::new();
        for watch in &self.watch_paths {
            if !seen.insert(watch.path.as_str()) {
                return Err(Error::config(format!(
                    "watch path '{}' is configured more than once",
                    watch.path
                )));
            }
        }

        if self.interval_secs == 0 {
            return Err(Error::config("interval must be greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout must be greater than 0"));
        }

        // An empty substring matches every file name.
        if self.ignore_patterns.iter().any(String::is_empty) {
            return Err(Error::config("ignore patterns cannot be empty strings"));
        }

        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(Error::config(format!(
                "server url '{}' must start with http:// or https://",
                self.server_url
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if let Some(addr) = &self.metrics_addr {
            addr.parse::<SocketAddr>()
                .map_err(|e| Error::config(format!("invalid metrics address '{addr}': {e}")))?;
        }

        Ok(())
    }

    /// Server address without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// Delay between poll cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Timeout applied to each remote request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Token value, empty when unset.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}
