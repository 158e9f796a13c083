//! Persistence gateway port
//!
//! The only path to durable storage used by the dispatch engine. Each
//! [`ChatStore::commit`] call is one transaction: either every row of the
//! batch is written or none is.

use async_trait::async_trait;
use chatlist_domain::{ModelDefinition, ModelId, PromptId, PromptText, ResultId, Tags};
use thiserror::Error;

/// Errors raised by store adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Backend(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Task join error: {0}")]
    Join(String),
}

/// Parent prompt of a commit batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRef {
    /// Prompt row written by an earlier commit of the same run
    Existing(PromptId),
    /// Reuse the row holding exactly this text, or create it inside the
    /// commit transaction
    New { text: PromptText, tags: Tags },
}

/// One result row to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResult {
    pub model_id: ModelId,
    pub response_text: String,
}

/// Everything written by one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBatch {
    pub prompt: PromptRef,
    pub results: Vec<PendingResult>,
}

/// Rows created by a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub prompt_id: PromptId,
    pub result_ids: Vec<ResultId>,
}

/// Transactional gateway to the prompts/models/results/settings store
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Models with `is_active = 1`, ordered by id
    async fn read_active_models(&self) -> Result<Vec<ModelDefinition>, StoreError>;

    async fn read_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn insert_prompt(&self, text: &PromptText, tags: &Tags) -> Result<PromptId, StoreError>;

    /// Oldest prompt row whose text equals `text` exactly
    async fn find_prompt_by_text(&self, text: &PromptText) -> Result<Option<PromptId>, StoreError>;

    async fn insert_result(
        &self,
        prompt_id: PromptId,
        model_id: ModelId,
        response_text: &str,
    ) -> Result<ResultId, StoreError>;

    /// Write the parent prompt (unless a row with its text exists) and every
    /// result in one transaction.
    async fn commit(&self, batch: CommitBatch) -> Result<CommitReceipt, StoreError>;
}
