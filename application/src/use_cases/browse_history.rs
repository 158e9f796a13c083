//! Browse History use case
//!
//! Read and prune committed prompts and results.

use crate::ports::chat_store::StoreError;
use crate::ports::history_store::{HistoryStore, ResultFilter};
use chatlist_domain::{Prompt, PromptId, ResultId, ResultRecord};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BrowseHistoryError {
    #[error("Prompt {0} not found")]
    PromptNotFound(PromptId),

    #[error("Result {0} not found")]
    ResultNotFound(ResultId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A prompt with every result committed for it
#[derive(Debug, Clone)]
pub struct PromptDetail {
    pub prompt: Prompt,
    pub results: Vec<ResultRecord>,
}

pub struct BrowseHistoryUseCase<S: HistoryStore + 'static> {
    store: Arc<S>,
}

impl<S: HistoryStore + 'static> BrowseHistoryUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Prompts newest first. A blank query lists everything.
    pub async fn prompts(&self, query: Option<&str>) -> Result<Vec<Prompt>, BrowseHistoryError> {
        let prompts = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.store.search_prompts(q).await?,
            None => self.store.list_prompts().await?,
        };
        Ok(prompts)
    }

    pub async fn prompt(&self, id: PromptId) -> Result<Prompt, BrowseHistoryError> {
        self.store
            .get_prompt(id)
            .await?
            .ok_or(BrowseHistoryError::PromptNotFound(id))
    }

    pub async fn prompt_detail(&self, id: PromptId) -> Result<PromptDetail, BrowseHistoryError> {
        let prompt = self.prompt(id).await?;
        let results = self.store.list_results(&ResultFilter::ForPrompt(id)).await?;
        Ok(PromptDetail { prompt, results })
    }

    /// Results newest first. A blank query lists everything.
    pub async fn results(&self, query: Option<&str>) -> Result<Vec<ResultRecord>, BrowseHistoryError> {
        let filter = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => ResultFilter::Matching(q.to_string()),
            None => ResultFilter::All,
        };
        Ok(self.store.list_results(&filter).await?)
    }

    /// Delete a prompt together with its results.
    pub async fn delete_prompt(&self, id: PromptId) -> Result<(), BrowseHistoryError> {
        if !self.store.delete_prompt(id).await? {
            return Err(BrowseHistoryError::PromptNotFound(id));
        }
        info!("Deleted prompt {}", id);
        Ok(())
    }

    pub async fn delete_result(&self, id: ResultId) -> Result<(), BrowseHistoryError> {
        if !self.store.delete_result(id).await? {
            return Err(BrowseHistoryError::ResultNotFound(id));
        }
        info!("Deleted result {}", id);
        Ok(())
    }
}
