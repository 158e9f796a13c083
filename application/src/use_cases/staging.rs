//! Staging Aggregator
//!
//! Holds the outcomes of the current run in memory until the user discards
//! them or commits a selection. Lane completions, `commit` and `discard` all
//! go through one async mutex, so they never interleave.
//!
//! Lanes write through a [`RunHandle`] bound to the run they belong to; a
//! handle from an older run (after `discard` or a new `begin_run`) can no
//! longer change anything.

use crate::ports::chat_store::{ChatStore, CommitBatch, PendingResult, PromptRef, StoreError};
use crate::ports::run_logger::{NoRunLogger, RunEvent, RunLogger};
use chatlist_domain::{
    ModelDefinition, ModelId, OutcomeStatus, PromptId, PromptText, ResultId, RunId,
    StagingOutcome, Tags,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors that reject a commit. Staging state is left untouched.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No staged run to commit")]
    NoActiveRun,

    #[error("No models selected")]
    EmptySelection,

    #[error("Prompt text does not match the staged run")]
    PromptMismatch,

    #[error("Model {0} is not part of the staged run")]
    UnknownModel(ModelId),

    #[error("Model {model_id} is {status}, only succeeded outcomes can be committed")]
    NotSucceeded {
        model_id: ModelId,
        status: OutcomeStatus,
    },

    #[error("Model {0} was already committed for this run")]
    AlreadyCommitted(ModelId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Read-only copy of the staging area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingSnapshot {
    pub run_id: Option<RunId>,
    pub prompt: Option<String>,
    /// Ordered by model id
    pub outcomes: Vec<StagingOutcome>,
    pub cancelled: bool,
    /// Prompt row created by an earlier commit of this run
    pub committed_prompt: Option<PromptId>,
}

impl StagingSnapshot {
    pub fn is_empty(&self) -> bool {
        self.run_id.is_none() && self.outcomes.is_empty()
    }

    pub fn outcome(&self, model_id: ModelId) -> Option<&StagingOutcome> {
        self.outcomes.iter().find(|o| o.model_id == model_id)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &StagingOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }
}

#[derive(Debug)]
struct StagedRun {
    id: RunId,
    prompt: PromptText,
    tags: Tags,
    outcomes: BTreeMap<ModelId, StagingOutcome>,
    cancelled: bool,
    committed_prompt: Option<PromptId>,
    committed: BTreeSet<ModelId>,
}

#[derive(Debug)]
struct StagingState {
    run: Option<StagedRun>,
    last_run: RunId,
}

impl StagingState {
    fn current(&mut self, run_id: RunId) -> Option<&mut StagedRun> {
        self.run.as_mut().filter(|run| run.id == run_id)
    }

    fn snapshot(&self) -> StagingSnapshot {
        match &self.run {
            Some(run) => StagingSnapshot {
                run_id: Some(run.id),
                prompt: Some(run.prompt.as_str().to_string()),
                outcomes: run.outcomes.values().cloned().collect(),
                cancelled: run.cancelled,
                committed_prompt: run.committed_prompt,
            },
            None => StagingSnapshot::default(),
        }
    }
}

/// Write handle a dispatch run uses to report lane outcomes
#[derive(Clone)]
pub struct RunHandle {
    run_id: RunId,
    state: Arc<Mutex<StagingState>>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Record a lane's terminal outcome.
    ///
    /// Returns `false` (and changes nothing) when the run is no longer
    /// current, the model is not part of it, or its outcome is already
    /// terminal (for example after cancellation).
    pub async fn record(&self, outcome: StagingOutcome) -> bool {
        let mut state = self.state.lock().await;
        let Some(run) = state.current(self.run_id) else {
            debug!("Ignoring outcome for stale {}", self.run_id);
            return false;
        };
        match run.outcomes.get_mut(&outcome.model_id) {
            Some(slot) if slot.status == OutcomeStatus::Pending && outcome.status.is_terminal() => {
                *slot = outcome;
                true
            }
            Some(slot) => {
                debug!(
                    "Ignoring late outcome for model {} ({})",
                    slot.model_id, slot.status
                );
                false
            }
            None => false,
        }
    }

    /// Update the attempt counter of a pending outcome.
    pub async fn note_attempt(&self, model_id: ModelId, attempts: u32) {
        let mut state = self.state.lock().await;
        if let Some(run) = state.current(self.run_id)
            && let Some(slot) = run.outcomes.get_mut(&model_id)
            && slot.status == OutcomeStatus::Pending
        {
            slot.attempts = attempts;
        }
    }

    /// Mark every still-pending outcome as cancelled. Returns how many were.
    pub async fn cancel_pending(&self) -> usize {
        let mut state = self.state.lock().await;
        let Some(run) = state.current(self.run_id) else {
            return 0;
        };
        run.cancelled = true;
        let mut count = 0;
        for outcome in run.outcomes.values_mut() {
            if outcome.status == OutcomeStatus::Pending {
                outcome.cancel();
                count += 1;
            }
        }
        count
    }

    /// Mark every still-pending outcome as failed with `reason`.
    pub async fn fail_pending(&self, reason: &str) -> usize {
        let mut state = self.state.lock().await;
        let Some(run) = state.current(self.run_id) else {
            return 0;
        };
        let mut count = 0;
        for outcome in run.outcomes.values_mut() {
            if outcome.status == OutcomeStatus::Pending {
                outcome.status = OutcomeStatus::Failed;
                outcome.error = Some(reason.to_string());
                count += 1;
            }
        }
        count
    }

    /// Outcomes of this run keyed by model id; empty if the run is gone.
    pub async fn outcomes(&self) -> BTreeMap<ModelId, StagingOutcome> {
        let mut state = self.state.lock().await;
        state
            .current(self.run_id)
            .map(|run| run.outcomes.clone())
            .unwrap_or_default()
    }
}

/// In-memory staging area for one run at a time
pub struct StagingAggregator<S: ChatStore + 'static> {
    store: Arc<S>,
    state: Arc<Mutex<StagingState>>,
    logger: Arc<dyn RunLogger>,
}

impl<S: ChatStore + 'static> StagingAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(StagingState {
                run: None,
                last_run: RunId::new(0),
            })),
            logger: Arc::new(NoRunLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Start a new run, replacing whatever was staged before.
    ///
    /// Seeds one pending outcome per model.
    pub async fn begin_run(
        &self,
        prompt: PromptText,
        tags: Tags,
        models: &[ModelDefinition],
    ) -> RunHandle {
        let mut state = self.state.lock().await;
        let run_id = state.last_run.next();
        state.last_run = run_id;
        state.run = Some(StagedRun {
            id: run_id,
            prompt,
            tags,
            outcomes: models
                .iter()
                .map(|m| (m.id, StagingOutcome::pending(m)))
                .collect(),
            cancelled: false,
            committed_prompt: None,
            committed: BTreeSet::new(),
        });
        debug!("Staging {} with {} models", run_id, models.len());

        RunHandle {
            run_id,
            state: Arc::clone(&self.state),
        }
    }

    /// Snapshot of the current staging state.
    pub async fn outcomes(&self) -> StagingSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Drop the staged run. Calling it again is a no-op.
    pub async fn discard(&self) {
        let mut state = self.state.lock().await;
        if let Some(run) = state.run.take() {
            info!("Discarded staged {}", run.id);
        }
    }

    /// Persist the selected succeeded outcomes.
    ///
    /// The whole selection is validated before anything is written, then the
    /// parent prompt and every result are written in one store transaction.
    /// The prompt row is created only on the first commit of its text; later
    /// commits, from this run or any other, attach to the existing row.
    pub async fn commit(
        &self,
        selected: &[ModelId],
        prompt_text: &str,
    ) -> Result<Vec<ResultId>, CommitError> {
        let mut state = self.state.lock().await;
        let run = state.run.as_mut().ok_or(CommitError::NoActiveRun)?;

        if selected.is_empty() {
            return Err(CommitError::EmptySelection);
        }
        if prompt_text.trim() != run.prompt.as_str() {
            return Err(CommitError::PromptMismatch);
        }

        let mut seen = BTreeSet::new();
        let mut results = Vec::with_capacity(selected.len());
        for model_id in selected {
            if !seen.insert(*model_id) {
                continue;
            }
            let outcome = run
                .outcomes
                .get(model_id)
                .ok_or(CommitError::UnknownModel(*model_id))?;
            if outcome.status != OutcomeStatus::Succeeded {
                return Err(CommitError::NotSucceeded {
                    model_id: *model_id,
                    status: outcome.status,
                });
            }
            if run.committed.contains(model_id) {
                return Err(CommitError::AlreadyCommitted(*model_id));
            }
            results.push(PendingResult {
                model_id: *model_id,
                response_text: outcome.response.clone().unwrap_or_default(),
            });
        }

        let prompt = match run.committed_prompt {
            Some(id) => PromptRef::Existing(id),
            None => PromptRef::New {
                text: run.prompt.clone(),
                tags: run.tags.clone(),
            },
        };

        // Lock stays held across the transaction so no lane write or discard
        // can interleave with it.
        let receipt = self.store.commit(CommitBatch { prompt, results }).await?;

        run.committed_prompt = Some(receipt.prompt_id);
        run.committed.extend(seen.iter().copied());

        info!(
            "Committed {} results for prompt {}",
            receipt.result_ids.len(),
            receipt.prompt_id
        );
        self.logger.log(RunEvent::new(
            "commit",
            serde_json::json!({
                "run": run.id.get(),
                "prompt_id": receipt.prompt_id.get(),
                "models": seen.iter().map(|m| m.get()).collect::<Vec<_>>(),
                "results": receipt.result_ids.iter().map(|r| r.get()).collect::<Vec<_>>(),
            }),
        ));

        Ok(receipt.result_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::testing::{MemoryStore, model};

    async fn staged(store: Arc<MemoryStore>) -> (StagingAggregator<MemoryStore>, RunHandle) {
        let aggregator = StagingAggregator::new(store);
        let models = vec![model(1, "alpha"), model(2, "beta"), model(3, "gamma")];
        let handle = aggregator
            .begin_run(PromptText::try_new("Why Rust?").unwrap(), Tags::new(["lang"]), &models)
            .await;
        assert!(handle.record(StagingOutcome::succeeded(&models[0], "Safety", 1)).await);
        assert!(handle.record(StagingOutcome::timed_out(&models[1], "timeout", 2)).await);
        assert!(handle.record(StagingOutcome::failed(&models[2], "HTTP 400", 1)).await);
        (aggregator, handle)
    }

    #[tokio::test]
    async fn test_begin_run_seeds_pending_outcomes() {
        let aggregator = StagingAggregator::new(Arc::new(MemoryStore::new()));
        let models = vec![model(7, "b"), model(3, "a")];
        aggregator
            .begin_run(PromptText::try_new("q").unwrap(), Tags::default(), &models)
            .await;

        let snapshot = aggregator.outcomes().await;
        assert_eq!(snapshot.outcomes.len(), 2);
        // ordered by model id, not by insertion
        assert_eq!(snapshot.outcomes[0].model_id, ModelId::new(3));
        assert!(snapshot
            .outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Pending));
    }

    #[tokio::test]
    async fn test_record_ignores_second_terminal_write() {
        let (aggregator, handle) = staged(Arc::new(MemoryStore::new())).await;
        let late = StagingOutcome::succeeded(&model(2, "beta"), "late", 3);
        assert!(!handle.record(late).await);
        let snapshot = aggregator.outcomes().await;
        assert_eq!(
            snapshot.outcome(ModelId::new(2)).unwrap().status,
            OutcomeStatus::TimedOut
        );
    }

    #[tokio::test]
    async fn test_cancel_keeps_recorded_success_and_drops_later_reply() {
        let aggregator = StagingAggregator::new(Arc::new(MemoryStore::new()));
        let models = vec![model(1, "alpha"), model(2, "beta")];
        let handle = aggregator
            .begin_run(PromptText::try_new("q").unwrap(), Tags::default(), &models)
            .await;

        assert!(handle.record(StagingOutcome::succeeded(&models[0], "done", 1)).await);
        assert_eq!(handle.cancel_pending().await, 1);
        // reply that reaches the lock after cancellation
        assert!(!handle.record(StagingOutcome::succeeded(&models[1], "late", 1)).await);

        let snapshot = aggregator.outcomes().await;
        assert_eq!(
            snapshot.outcome(ModelId::new(1)).unwrap().status,
            OutcomeStatus::Succeeded
        );
        assert_eq!(
            snapshot.outcome(ModelId::new(2)).unwrap().status,
            OutcomeStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_stale_handle_cannot_write() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StagingAggregator::new(store);
        let models = vec![model(1, "alpha")];
        let old = aggregator
            .begin_run(PromptText::try_new("first").unwrap(), Tags::default(), &models)
            .await;
        aggregator
            .begin_run(PromptText::try_new("second").unwrap(), Tags::default(), &models)
            .await;

        assert!(!old.record(StagingOutcome::succeeded(&models[0], "x", 1)).await);
        assert_eq!(old.cancel_pending().await, 0);
        assert!(old.outcomes().await.is_empty());
        assert_eq!(
            aggregator.outcomes().await.outcomes[0].status,
            OutcomeStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_discard_is_idempotent() {
        let (aggregator, handle) = staged(Arc::new(MemoryStore::new())).await;
        aggregator.discard().await;
        assert!(aggregator.outcomes().await.is_empty());
        aggregator.discard().await;
        assert!(aggregator.outcomes().await.is_empty());
        assert!(!handle.record(StagingOutcome::succeeded(&model(1, "alpha"), "x", 1)).await);
    }

    #[tokio::test]
    async fn test_commit_single_succeeded_outcome() {
        let store = Arc::new(MemoryStore::new());
        let (aggregator, _) = staged(Arc::clone(&store)).await;

        let ids = aggregator.commit(&[ModelId::new(1)], "Why Rust?").await.unwrap();
        assert_eq!(ids.len(), 1);

        let prompts = store.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].1, "Why Rust?");
        let results = store.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model_id, ModelId::new(1));
        assert_eq!(results[0].response_text, "Safety");
        assert_eq!(results[0].prompt_id, prompts[0].0);
    }

    #[tokio::test]
    async fn test_commit_rejects_non_succeeded_atomically() {
        let store = Arc::new(MemoryStore::new());
        let (aggregator, _) = staged(Arc::clone(&store)).await;
        let before = aggregator.outcomes().await;

        let err = aggregator
            .commit(&[ModelId::new(1), ModelId::new(3)], "Why Rust?")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommitError::NotSucceeded { model_id, status: OutcomeStatus::Failed }
                if model_id == ModelId::new(3)
        ));
        assert!(store.results().is_empty());
        assert!(store.prompts().is_empty());
        assert_eq!(aggregator.outcomes().await, before);
    }

    #[tokio::test]
    async fn test_commit_rejects_unknown_and_empty() {
        let (aggregator, _) = staged(Arc::new(MemoryStore::new())).await;
        assert!(matches!(
            aggregator.commit(&[ModelId::new(99)], "Why Rust?").await,
            Err(CommitError::UnknownModel(_))
        ));
        assert!(matches!(
            aggregator.commit(&[], "Why Rust?").await,
            Err(CommitError::EmptySelection)
        ));
        assert!(matches!(
            aggregator.commit(&[ModelId::new(1)], "Why Go?").await,
            Err(CommitError::PromptMismatch)
        ));
    }

    #[tokio::test]
    async fn test_commit_without_run() {
        let aggregator = StagingAggregator::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            aggregator.commit(&[ModelId::new(1)], "q").await,
            Err(CommitError::NoActiveRun)
        ));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_staging_untouched() {
        let store = Arc::new(MemoryStore::new());
        let (aggregator, _) = staged(Arc::clone(&store)).await;
        store.fail_next_commit();

        let before = aggregator.outcomes().await;
        let err = aggregator.commit(&[ModelId::new(1)], "Why Rust?").await.unwrap_err();
        assert!(matches!(err, CommitError::Store(_)));
        assert_eq!(aggregator.outcomes().await, before);

        // retry succeeds once the store recovers
        assert_eq!(
            aggregator
                .commit(&[ModelId::new(1)], "Why Rust?")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_second_commit_reuses_prompt_row() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StagingAggregator::new(Arc::clone(&store));
        let models = vec![model(1, "alpha"), model(2, "beta")];
        let handle = aggregator
            .begin_run(PromptText::try_new("q").unwrap(), Tags::default(), &models)
            .await;
        handle.record(StagingOutcome::succeeded(&models[0], "a", 1)).await;
        handle.record(StagingOutcome::succeeded(&models[1], "b", 1)).await;

        aggregator.commit(&[ModelId::new(1)], "q").await.unwrap();
        aggregator.commit(&[ModelId::new(2)], "q").await.unwrap();
        assert_eq!(store.prompts().len(), 1);
        assert_eq!(store.results().len(), 2);

        assert!(matches!(
            aggregator.commit(&[ModelId::new(2)], "q").await,
            Err(CommitError::AlreadyCommitted(_))
        ));
    }

    #[tokio::test]
    async fn test_same_text_in_new_run_reuses_prompt_row() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StagingAggregator::new(Arc::clone(&store));
        let models = vec![model(1, "alpha")];

        let mut committed = Vec::new();
        for answer in ["Safety", "Speed"] {
            let handle = aggregator
                .begin_run(PromptText::try_new("Why Rust?").unwrap(), Tags::default(), &models)
                .await;
            handle.record(StagingOutcome::succeeded(&models[0], answer, 1)).await;
            committed.extend(aggregator.commit(&[ModelId::new(1)], "Why Rust?").await.unwrap());
        }

        let prompts = store.prompts();
        assert_eq!(prompts.len(), 1);
        let results = store.results();
        assert_eq!(committed.len(), 2);
        assert!(results.iter().all(|r| r.prompt_id == prompts[0].0));
        assert_eq!(
            results.iter().map(|r| r.response_text.as_str()).collect::<Vec<_>>(),
            vec!["Safety", "Speed"]
        );
    }
}
