//! Infrastructure layer for chatlist
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;
pub mod secrets;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDatabaseConfig, FileDispatchConfig,
    FileLoggingConfig, FileOutputConfig,
};
pub use http::HttpModelClient;
pub use logging::JsonlRunLogger;
pub use secrets::EnvSecretResolver;
pub use store::SqliteChatStore;
