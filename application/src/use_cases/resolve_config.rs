//! Configuration Resolver
//!
//! Reads the active models and the dispatch policy from the store before each
//! run. Bad or missing settings never abort a run; they fall back to the
//! built-in defaults. An empty model set does.

use crate::ports::chat_store::{ChatStore, StoreError};
use chatlist_domain::policy::setting_key;
use chatlist_domain::{FallbackReason, ModelDefinition, Policy, PolicyDefaults};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that stop a run before dispatch starts
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("No active models configured")]
    NoActiveModels,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Models and policy of one run
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    /// Active models ordered by id
    pub models: Vec<ModelDefinition>,
    pub policy: Policy,
}

pub struct ConfigurationResolver<S: ChatStore + 'static> {
    store: Arc<S>,
    defaults: PolicyDefaults,
}

impl<S: ChatStore + 'static> ConfigurationResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            defaults: PolicyDefaults::default(),
        }
    }

    /// Override the built-in fallback values.
    pub fn with_defaults(mut self, defaults: PolicyDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub async fn resolve(&self) -> Result<ResolvedRun, ConfigurationError> {
        let models = self.store.read_active_models().await?;
        if models.is_empty() {
            return Err(ConfigurationError::NoActiveModels);
        }

        let mut raw = HashMap::new();
        for info in setting_key::known_keys() {
            if let Some(value) = self.store.read_setting(info.key).await? {
                raw.insert(info.key, value);
            }
        }

        let (policy, fallbacks) = Policy::from_settings(&self.defaults, |key| raw.get(key).cloned());
        for fallback in &fallbacks {
            match &fallback.reason {
                FallbackReason::Missing => {
                    debug!("Setting {} not set, using built-in default", fallback.key)
                }
                FallbackReason::Invalid(value) => warn!(
                    "Setting {} has invalid value {:?}, using built-in default",
                    fallback.key, value
                ),
            }
        }

        debug!(
            "Resolved {} active models, timeout {:?}, max retries {}",
            models.len(),
            policy.timeout,
            policy.max_retries
        );

        Ok(ResolvedRun { models, policy })
    }
}
