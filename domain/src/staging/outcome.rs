//! Staging outcome value objects
//!
//! A [`StagingOutcome`] is one model's participation in one run. It starts
//! `Pending` and moves exactly once to a terminal status.

use crate::catalog::entities::ModelDefinition;
use crate::core::ids::ModelId;
use serde::{Deserialize, Serialize};

/// Status of one model's lane within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Pending,
    Succeeded,
    /// The provider rejected the request; never retried
    Failed,
    /// Every attempt ended in a timeout or transport failure
    TimedOut,
    Cancelled,
}

impl OutcomeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutcomeStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Pending => "pending",
            OutcomeStatus::Succeeded => "succeeded",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::TimedOut => "timed-out",
            OutcomeStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One model's outcome within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingOutcome {
    pub model_id: ModelId,
    pub model_name: String,
    pub status: OutcomeStatus,
    /// Response text when succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Error detail when failed, timed out or cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempts issued so far
    pub attempts: u32,
}

impl StagingOutcome {
    pub fn pending(model: &ModelDefinition) -> Self {
        Self {
            model_id: model.id,
            model_name: model.name.clone(),
            status: OutcomeStatus::Pending,
            response: None,
            error: None,
            attempts: 0,
        }
    }

    pub fn succeeded(model: &ModelDefinition, text: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: OutcomeStatus::Succeeded,
            response: Some(text.into()),
            attempts,
            ..Self::pending(model)
        }
    }

    pub fn failed(model: &ModelDefinition, error: impl Into<String>, attempts: u32) -> Self {
        Self::terminal_error(model, OutcomeStatus::Failed, error, attempts)
    }

    pub fn timed_out(model: &ModelDefinition, error: impl Into<String>, attempts: u32) -> Self {
        Self::terminal_error(model, OutcomeStatus::TimedOut, error, attempts)
    }

    pub fn cancelled(model: &ModelDefinition, attempts: u32) -> Self {
        Self::terminal_error(model, OutcomeStatus::Cancelled, "run cancelled", attempts)
    }

    fn terminal_error(
        model: &ModelDefinition,
        status: OutcomeStatus,
        error: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            status,
            error: Some(error.into()),
            attempts,
            ..Self::pending(model)
        }
    }

    /// Mark a still-pending outcome as cancelled, keeping its attempt count.
    pub fn cancel(&mut self) {
        if self.status == OutcomeStatus::Pending {
            self.status = OutcomeStatus::Cancelled;
            self.error = Some("run cancelled".to_string());
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    /// Text shown beside the model: the answer, or the error detail.
    pub fn display_text(&self) -> &str {
        match (&self.response, &self.error) {
            (Some(text), _) => text,
            (None, Some(err)) => err,
            (None, None) => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelDefinition {
        ModelDefinition::new(ModelId::new(4), "deepseek", "https://api.deepseek.com", "DS_KEY")
    }

    #[test]
    fn test_constructors_set_status() {
        let m = model();
        assert_eq!(StagingOutcome::pending(&m).status, OutcomeStatus::Pending);
        let ok = StagingOutcome::succeeded(&m, "42", 1);
        assert!(ok.is_success());
        assert_eq!(ok.display_text(), "42");
        let failed = StagingOutcome::failed(&m, "HTTP 400", 1);
        assert_eq!(failed.status, OutcomeStatus::Failed);
        assert_eq!(failed.display_text(), "HTTP 400");
        assert_eq!(StagingOutcome::timed_out(&m, "t", 2).attempts, 2);
    }

    #[test]
    fn test_cancel_only_touches_pending() {
        let m = model();
        let mut pending = StagingOutcome::pending(&m);
        pending.attempts = 1;
        pending.cancel();
        assert_eq!(pending.status, OutcomeStatus::Cancelled);
        assert_eq!(pending.attempts, 1);

        let mut ok = StagingOutcome::succeeded(&m, "done", 1);
        ok.cancel();
        assert_eq!(ok.status, OutcomeStatus::Succeeded);
    }

    #[test]
    fn test_status_terminal_and_serde() {
        assert!(!OutcomeStatus::Pending.is_terminal());
        assert!(OutcomeStatus::Cancelled.is_terminal());
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::TimedOut).unwrap(),
            "\"timed-out\""
        );
    }
}
