//! Save Prompt use case
//!
//! Store a prompt for later without dispatching it. A prompt's text is stored
//! once; saving the same text again returns the existing row.

use crate::ports::chat_store::{ChatStore, StoreError};
use chatlist_domain::{DomainError, PromptId, PromptText, Tags};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SavePromptError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Row a save resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedPrompt {
    pub id: PromptId,
    /// `false` when the text was already stored
    pub created: bool,
}

pub struct SavePromptUseCase<S: ChatStore + 'static> {
    store: Arc<S>,
}

impl<S: ChatStore + 'static> SavePromptUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn save(&self, text: &str, tags: Tags) -> Result<SavedPrompt, SavePromptError> {
        let text = PromptText::try_new(text)?;
        if let Some(id) = self.store.find_prompt_by_text(&text).await? {
            return Ok(SavedPrompt { id, created: false });
        }
        let id = self.store.insert_prompt(&text, &tags).await?;
        info!("Saved prompt {}", id);
        Ok(SavedPrompt { id, created: true })
    }
}
