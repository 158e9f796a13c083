//! Model Client port
//!
//! A single-attempt primitive: one request to one model endpoint, bounded by
//! a deadline. Retrying is the dispatcher's job, never the client's.

use async_trait::async_trait;
use chatlist_domain::ModelDefinition;
use std::time::Duration;
use thiserror::Error;

/// Classified failure of a single call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider error{}: {body}", status_suffix(.status))]
    Provider { status: Option<u16>, body: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl CallError {
    pub fn provider(status: Option<u16>, body: impl Into<String>) -> Self {
        CallError::Provider {
            status,
            body: body.into(),
        }
    }

    /// Timeouts and transport failures may succeed on another attempt;
    /// provider rejections will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, CallError::Timeout(_) | CallError::Transport(_))
    }
}

/// Client for one model endpoint
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` to `model` and return the answer text.
    async fn send(
        &self,
        model: &ModelDefinition,
        prompt: &str,
        deadline: Duration,
    ) -> Result<String, CallError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CallError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(CallError::Transport("connection reset".into()).is_transient());
        assert!(!CallError::provider(Some(400), "bad request").is_transient());
        assert!(!CallError::provider(None, "secret missing").is_transient());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CallError::provider(Some(401), "unauthorized").to_string(),
            "Provider error (HTTP 401): unauthorized"
        );
        assert_eq!(
            CallError::provider(None, "no key").to_string(),
            "Provider error: no key"
        );
        assert_eq!(
            CallError::Timeout(Duration::from_secs(5)).to_string(),
            "Timed out after 5s"
        );
    }
}
