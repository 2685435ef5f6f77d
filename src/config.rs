//! Configuration module for GitDrop.

use serde::Deserialize;
use std::path::Path;

use crate::names::sanitize_folder_name;
use crate::{GitDropError, Result};

/// Repository that backs the file store.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Repository owner (user or organization).
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// Branch that every read and write targets.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Base URL of the REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            api_base_url: default_api_base_url(),
        }
    }
}

/// Layout of the hosted files inside the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory under which every folder lives.
    #[serde(default = "default_file_base_path")]
    pub file_base_path: String,
    /// Folder selected when nothing else is.
    #[serde(default = "default_folder")]
    pub default_folder: String,
    /// Base URL the repository is published under.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Name of the placeholder object that keeps a folder alive.
    #[serde(default = "default_marker_name")]
    pub marker_name: String,
}

fn default_file_base_path() -> String {
    "storage".to_string()
}

fn default_folder() -> String {
    "default".to_string()
}

fn default_public_base_url() -> String {
    "https://files.example.com".to_string()
}

fn default_marker_name() -> String {
    ".gitkeep".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_base_path: default_file_base_path(),
            default_folder: default_folder(),
            public_base_url: default_public_base_url(),
            marker_name: default_marker_name(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("gitdrop/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, written in addition to stderr.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Backing repository.
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// File layout.
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP transport.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GitDropError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GitDropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GITDROP_OWNER`, `GITDROP_REPO`, `GITDROP_BRANCH`
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            ("GITDROP_OWNER", &mut self.repository.owner),
            ("GITDROP_REPO", &mut self.repository.repo),
            ("GITDROP_BRANCH", &mut self.repository.branch),
        ];
        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("repository.owner", &self.repository.owner),
            ("repository.repo", &self.repository.repo),
            ("repository.branch", &self.repository.branch),
            ("storage.file_base_path", &self.storage.file_base_path),
            ("storage.marker_name", &self.storage.marker_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(GitDropError::Config(format!("{key} must not be empty")));
            }
        }

        let folder = &self.storage.default_folder;
        if folder.is_empty() || sanitize_folder_name(folder) != *folder {
            return Err(GitDropError::Config(format!(
                "storage.default_folder {folder:?} may only contain letters, digits, '_' and '-'"
            )));
        }

        url::Url::parse(&self.repository.api_base_url).map_err(|e| {
            GitDropError::Config(format!("repository.api_base_url is invalid: {e}"))
        })?;

        Ok(())
    }
}
