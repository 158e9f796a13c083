//! Domain error types

use thiserror::Error;

/// Domain-level validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Model name cannot be empty")]
    EmptyModelName,

    #[error("API URL cannot be empty")]
    EmptyApiUrl,

    #[error("API URL must start with http:// or https://: {0}")]
    InvalidApiUrl(String),

    #[error("Secret reference (environment variable name) cannot be empty")]
    EmptySecretRef,

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}
