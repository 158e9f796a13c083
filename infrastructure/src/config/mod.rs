//! Configuration file loading for chatlist
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CHATLIST_*` environment variables (`CHATLIST_DISPATCH__MAX_RETRIES=3`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./chatlist.toml` or `./.chatlist.toml`
//! 4. Global: `$XDG_CONFIG_HOME/chatlist/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_DATABASE_FILE, FileConfig, FileDatabaseConfig,
    FileDispatchConfig, FileLoggingConfig, FileOutputConfig,
};
pub use loader::ConfigLoader;
