//! Dispatcher
//!
//! Fans one prompt out to every model at once. Each model gets its own lane
//! (a spawned task) that issues attempts one after another:
//!
//! 1. Send with a per-attempt deadline of `policy.timeout`
//! 2. On timeout or transport failure, back off and retry, at most
//!    `policy.max_retries` times
//! 3. On a provider error, stop immediately
//!
//! A lane writes its terminal outcome into staging as soon as it has one, so
//! a cancellation arriving later cannot erase it. Cancellation marks every
//! lane still pending as `cancelled`, stops further retries, and ignores any
//! answer that arrives afterwards.

use crate::ports::model_client::{CallError, ModelClient};
use crate::ports::progress::DispatchProgress;
use crate::ports::run_logger::{NoRunLogger, RunEvent, RunLogger};
use crate::use_cases::staging::RunHandle;
use chatlist_domain::{ModelDefinition, ModelId, Policy, PromptText, RunId, StagingOutcome};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome map of a finished (or cancelled) run
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub run_id: RunId,
    /// Exactly one terminal outcome per dispatched model
    pub outcomes: BTreeMap<ModelId, StagingOutcome>,
    pub cancelled: bool,
}

impl DispatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &StagingOutcome> {
        self.outcomes.values().filter(|o| o.is_success())
    }
}

pub struct Dispatcher<C: ModelClient + 'static> {
    client: Arc<C>,
    logger: Arc<dyn RunLogger>,
}

impl<C: ModelClient + 'static> Dispatcher<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            logger: Arc::new(NoRunLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Dispatch `prompt` to `models` and wait for every lane, or for `cancel`.
    pub async fn run(
        &self,
        prompt: &PromptText,
        models: &[ModelDefinition],
        policy: Policy,
        staging: &RunHandle,
        cancel: &CancellationToken,
        progress: &dyn DispatchProgress,
    ) -> DispatchReport {
        info!(
            "Dispatching {} to {} models (timeout {:?}, max retries {})",
            staging.run_id(),
            models.len(),
            policy.timeout,
            policy.max_retries
        );
        self.logger.log(RunEvent::new(
            "run_started",
            serde_json::json!({
                "run": staging.run_id().get(),
                "prompt": prompt.as_str(),
                "models": models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
                "timeout_ms": policy.timeout.as_millis() as u64,
                "max_retries": policy.max_retries,
            }),
        ));
        progress.on_run_start(models);

        let prompt: Arc<str> = Arc::from(prompt.as_str());
        let mut join_set = JoinSet::new();

        for model in models {
            let lane = Lane {
                client: Arc::clone(&self.client),
                logger: Arc::clone(&self.logger),
                model: model.clone(),
                prompt: Arc::clone(&prompt),
                policy,
                staging: staging.clone(),
                cancel: cancel.clone(),
            };
            // A lane counts as finished once `record` has taken the staging
            // lock. A reply that loses the lock to `cancel_pending` is dropped
            // and the lane stays cancelled.
            join_set.spawn(async move {
                let outcome = lane.run().await;
                let accepted = lane.staging.record(outcome.clone()).await;
                (outcome, accepted)
            });
        }

        let mut cancelled = false;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    let marked = staging.cancel_pending().await;
                    info!("{} cancelled, {} lanes still pending", staging.run_id(), marked);
                    join_set.abort_all();
                    break;
                }
                next = join_set.join_next() => next,
            };

            let Some(joined) = next else {
                break;
            };
            match joined {
                Ok((outcome, true)) => {
                    self.log_lane(staging.run_id(), &outcome);
                    progress.on_lane_complete(&outcome);
                }
                Ok((outcome, false)) => {
                    debug!("Lane for {} reported after the run moved on", outcome.model_name);
                }
                Err(e) => {
                    warn!("Lane task join error: {}", e);
                }
            }
        }

        // Drain aborted lanes; whatever they still report is ignored by staging.
        while join_set.join_next().await.is_some() {}

        if !cancelled {
            let orphaned = staging
                .fail_pending("lane terminated without reporting an outcome")
                .await;
            if orphaned > 0 {
                warn!("{} lanes ended without an outcome", orphaned);
            }
        }

        let outcomes = staging.outcomes().await;
        self.logger.log(RunEvent::new(
            if cancelled { "run_cancelled" } else { "run_finished" },
            serde_json::json!({
                "run": staging.run_id().get(),
                "succeeded": outcomes.values().filter(|o| o.is_success()).count(),
                "total": outcomes.len(),
            }),
        ));
        progress.on_run_complete(cancelled);

        DispatchReport {
            run_id: staging.run_id(),
            outcomes,
            cancelled,
        }
    }

    fn log_lane(&self, run_id: RunId, outcome: &StagingOutcome) {
        match &outcome.error {
            None => info!(
                "Model {} {} after {} attempt(s)",
                outcome.model_name, outcome.status, outcome.attempts
            ),
            Some(error) => warn!(
                "Model {} {} after {} attempt(s): {}",
                outcome.model_name, outcome.status, outcome.attempts, error
            ),
        }
        self.logger.log(RunEvent::new(
            "lane_finished",
            serde_json::json!({
                "run": run_id.get(),
                "model": outcome.model_name,
                "status": outcome.status.as_str(),
                "attempts": outcome.attempts,
                "error": outcome.error,
                "bytes": outcome.response.as_ref().map(|r| r.len()),
            }),
        ));
    }
}

/// One model's sequential attempt loop
struct Lane<C: ModelClient + 'static> {
    client: Arc<C>,
    logger: Arc<dyn RunLogger>,
    model: ModelDefinition,
    prompt: Arc<str>,
    policy: Policy,
    staging: RunHandle,
    cancel: CancellationToken,
}

impl<C: ModelClient + 'static> Lane<C> {
    async fn run(&self) -> StagingOutcome {
        let mut attempts = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return StagingOutcome::cancelled(&self.model, attempts);
            }

            attempts += 1;
            self.staging.note_attempt(self.model.id, attempts).await;

            let call = tokio::time::timeout(
                self.policy.timeout,
                self.client.send(&self.model, &self.prompt, self.policy.timeout),
            );
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return StagingOutcome::cancelled(&self.model, attempts);
                }
                result = call => result.unwrap_or(Err(CallError::Timeout(self.policy.timeout))),
            };

            let error = match result {
                Ok(text) => return StagingOutcome::succeeded(&self.model, text, attempts),
                Err(error) if !error.is_transient() => {
                    return StagingOutcome::failed(&self.model, error.to_string(), attempts);
                }
                Err(error) => error,
            };

            debug!(
                "Model {} attempt {}/{} failed: {}",
                self.model.name,
                attempts,
                self.policy.max_attempts(),
                error
            );
            self.logger.log(RunEvent::new(
                "attempt_failed",
                serde_json::json!({
                    "run": self.staging.run_id().get(),
                    "model": self.model.name,
                    "attempt": attempts,
                    "error": error.to_string(),
                }),
            ));

            if attempts >= self.policy.max_attempts() {
                return StagingOutcome::timed_out(&self.model, error.to_string(), attempts);
            }

            let delay = self.policy.backoff.delay_for(attempts);
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        return StagingOutcome::cancelled(&self.model, attempts);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
