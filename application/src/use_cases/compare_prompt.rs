//! Compare Prompt use case
//!
//! One prompt in, one staged run out: resolve the configuration, seed the
//! staging area, dispatch to every active model. The caller then reviews the
//! staged outcomes and commits or discards them through [`StagingAggregator`].

use crate::ports::chat_store::ChatStore;
use crate::ports::model_client::ModelClient;
use crate::ports::progress::{DispatchProgress, NoProgress};
use crate::ports::run_logger::RunLogger;
use crate::use_cases::dispatch::{DispatchReport, Dispatcher};
use crate::use_cases::resolve_config::{ConfigurationError, ConfigurationResolver};
use crate::use_cases::staging::StagingAggregator;
use chatlist_domain::{DomainError, PolicyDefaults, Prompt, PromptText, Tags};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum ComparePromptError {
    #[error(transparent)]
    InvalidPrompt(#[from] DomainError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Input for the ComparePrompt use case
#[derive(Debug, Clone)]
pub struct ComparePromptInput {
    pub prompt: String,
    pub tags: Tags,
}

impl ComparePromptInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tags: Tags::default(),
        }
    }

    /// Re-run a stored prompt with its text and tags.
    ///
    /// Committing the run attaches the new results to the stored row.
    pub fn from_saved(prompt: &Prompt) -> Self {
        Self {
            prompt: prompt.text.clone(),
            tags: prompt.tags.clone(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

pub struct ComparePromptUseCase<C: ModelClient + 'static, S: ChatStore + 'static> {
    resolver: ConfigurationResolver<S>,
    dispatcher: Dispatcher<C>,
    staging: Arc<StagingAggregator<S>>,
}

impl<C: ModelClient + 'static, S: ChatStore + 'static> ComparePromptUseCase<C, S> {
    pub fn new(client: Arc<C>, store: Arc<S>) -> Self {
        Self {
            resolver: ConfigurationResolver::new(Arc::clone(&store)),
            dispatcher: Dispatcher::new(client),
            staging: Arc::new(StagingAggregator::new(store)),
        }
    }

    /// Use a shared staging area (and its logger) instead of a private one.
    pub fn with_staging(mut self, staging: Arc<StagingAggregator<S>>) -> Self {
        self.staging = staging;
        self
    }

    pub fn with_defaults(mut self, defaults: PolicyDefaults) -> Self {
        self.resolver = self.resolver.with_defaults(defaults);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.dispatcher = self.dispatcher.with_logger(logger);
        self
    }

    /// Staging area the runs of this use case land in
    pub fn staging(&self) -> Arc<StagingAggregator<S>> {
        Arc::clone(&self.staging)
    }

    pub async fn execute(
        &self,
        input: ComparePromptInput,
    ) -> Result<DispatchReport, ComparePromptError> {
        self.execute_with_progress(input, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Run the prompt against every active model.
    ///
    /// Fails before anything is staged when the prompt is blank or no model
    /// is active. Per-model failures never fail the run.
    pub async fn execute_with_progress(
        &self,
        input: ComparePromptInput,
        progress: &dyn DispatchProgress,
        cancel: &CancellationToken,
    ) -> Result<DispatchReport, ComparePromptError> {
        let prompt = PromptText::try_new(input.prompt)?;
        let resolved = self.resolver.resolve().await?;

        let handle = self
            .staging
            .begin_run(prompt.clone(), input.tags, &resolved.models)
            .await;

        Ok(self
            .dispatcher
            .run(&prompt, &resolved.models, resolved.policy, &handle, cancel, progress)
            .await)
    }
}
