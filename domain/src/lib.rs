//! Domain layer for chatlist
//!
//! This crate contains the entities, value objects and pure policy of the
//! prompt comparison engine. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! - **Model**: a configured AI endpoint ([`ModelDefinition`])
//! - **Run**: one dispatch of a prompt to every active model
//! - **Staging Outcome**: one model's transient result within a run
//! - **Policy**: the resolved timeout/retry rules of a run
//! - **Commit**: persisting selected successful outcomes as results

pub mod catalog;
pub mod core;
pub mod history;
pub mod policy;
pub mod staging;

// Re-export commonly used types
pub use catalog::{
    entities::{ModelDefinition, ModelPatch, NewModel, SecretRef},
    provider::ProviderKind,
};
pub use core::{
    error::DomainError,
    ids::{ModelId, PromptId, ResultId, RunId},
};
pub use history::{
    prompt::{Prompt, PromptText},
    result::{ResultRecord, StoredResult},
    tags::Tags,
};
pub use policy::{
    dispatch_policy::{FallbackReason, Policy, PolicyDefaults, PolicyFallback, RetryBackoff},
    setting_key::{SettingKeyInfo, known_keys, lookup_key},
};
pub use staging::outcome::{OutcomeStatus, StagingOutcome};
