//! History store port: browsing prompts and committed results.

use crate::ports::chat_store::StoreError;
use async_trait::async_trait;
use chatlist_domain::{Prompt, PromptId, ResultId, ResultRecord};

/// Which results to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultFilter {
    All,
    ForPrompt(PromptId),
    /// Substring match on response text, prompt text or model name
    Matching(String),
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All prompts, newest first
    async fn list_prompts(&self) -> Result<Vec<Prompt>, StoreError>;

    async fn get_prompt(&self, id: PromptId) -> Result<Option<Prompt>, StoreError>;

    /// Substring match on prompt text or tags, newest first
    async fn search_prompts(&self, query: &str) -> Result<Vec<Prompt>, StoreError>;

    /// Deletes the prompt and, by cascade, its results.
    async fn delete_prompt(&self, id: PromptId) -> Result<bool, StoreError>;

    /// Matching results, newest first
    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<ResultRecord>, StoreError>;

    async fn delete_result(&self, id: ResultId) -> Result<bool, StoreError>;
}
