//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quotebook/config.toml)
//! 3. Environment variables (QUOTEBOOK_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "QUOTEBOOK";

/// Stand-in REST resource used as the remote quote source
pub const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for durable storage (local_storage.json)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote quote source endpoint
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Whether periodic sync starts automatically
    #[serde(default)]
    pub auto_sync: bool,

    /// Seconds between automatic syncs
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Local changes younger than this many seconds block a blind merge
    #[serde(default = "default_conflict_window_secs")]
    pub conflict_window_secs: u64,

    /// How many remote records are mapped into quotes per fetch
    #[serde(default = "default_remote_quote_limit")]
    pub remote_quote_limit: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional log file (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_url: default_remote_url(),
            auto_sync: false,
            sync_interval_secs: default_sync_interval_secs(),
            conflict_window_secs: default_conflict_window_secs(),
            remote_quote_limit: default_remote_quote_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QUOTEBOOK_DATA_DIR, QUOTEBOOK_REMOTE_URL, ...)
    /// 2. Config file (~/.config/quotebook/config.toml or QUOTEBOOK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let config = Self::read_from_path(path)?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration for editing
    ///
    /// Skips validation so `config set` can repair a rejected value.
    pub fn load_for_edit(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::read_from_path(path),
            None => Self::read_from_path(&Self::config_file_path()),
        }
    }

    fn read_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the sync timer and HTTP client can't run with
    pub fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            bail!("sync_interval_secs must be at least 1 second");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1 second");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // An empty value restores the default endpoint
        if let Ok(val) = std::env::var(format!("{}_REMOTE_URL", ENV_PREFIX)) {
            self.remote_url = if val.trim().is_empty() {
                default_remote_url()
            } else {
                val.trim().to_string()
            };
        }

        if let Ok(val) = std::env::var(format!("{}_AUTO_SYNC", ENV_PREFIX)) {
            self.auto_sync = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_INTERVAL_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.trim().parse::<u64>() {
                self.sync_interval_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_CONFLICT_WINDOW_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.trim().parse::<u64>() {
                self.conflict_window_secs = secs;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUOTEBOOK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotebook")
            .join("config.toml")
    }

    /// Get the path to the durable key-value file
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }

    /// Interval between automatic syncs
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Recency window used by conflict detection
    pub fn conflict_window(&self) -> Duration {
        Duration::from_secs(self.conflict_window_secs)
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotebook")
}

fn default_remote_url() -> String {
    DEFAULT_REMOTE_URL.to_string()
}

fn default_sync_interval_secs() -> u64 {
    30
}

fn default_conflict_window_secs() -> u64 {
    60
}

fn default_remote_quote_limit() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}
