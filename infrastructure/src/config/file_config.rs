//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

use chatlist_domain::PolicyDefaults;
use chatlist_domain::policy::dispatch_policy::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// File name of the database when no path is configured
pub const DEFAULT_DATABASE_FILE: &str = "chatlist.db";

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("dispatch.default_timeout cannot be 0")]
    InvalidTimeout,

    #[error("database.path cannot be empty")]
    EmptyDatabasePath,
}

/// Raw `[database]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDatabaseConfig {
    /// SQLite file; defaults to the user data directory
    pub path: Option<String>,
}

impl FileDatabaseConfig {
    /// Configured path, or `<data dir>/chatlist/chatlist.db`
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .map(|d| d.join("chatlist").join(DEFAULT_DATABASE_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
        }
    }
}

/// Raw `[dispatch]` section: fallbacks for settings missing from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Seconds
    pub default_timeout: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl FileDispatchConfig {
    pub fn to_policy_defaults(&self) -> PolicyDefaults {
        PolicyDefaults {
            timeout_secs: self.default_timeout,
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}

/// Raw `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Enable colored terminal output
    pub color: bool,
    /// Show per-model progress while a prompt is dispatched
    pub show_progress: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_progress: true,
        }
    }
}

/// Raw `[logging]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of every run; disabled when unset
    pub run_log: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub database: FileDatabaseConfig,
    pub dispatch: FileDispatchConfig,
    pub output: FileOutputConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.dispatch.default_timeout == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if let Some(path) = &self.database.path
            && path.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyDatabasePath);
        }
        Ok(())
    }
}
