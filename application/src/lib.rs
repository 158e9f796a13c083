//! Application layer for chatlist
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    catalog_store::CatalogStore,
    chat_store::{ChatStore, CommitBatch, CommitReceipt, PendingResult, PromptRef, StoreError},
    history_store::{HistoryStore, ResultFilter},
    model_client::{CallError, ModelClient},
    progress::{DispatchProgress, NoProgress},
    run_logger::{NoRunLogger, RunEvent, RunLogger},
    secret_resolver::{SecretError, SecretResolver},
};
pub use use_cases::browse_history::{BrowseHistoryError, BrowseHistoryUseCase, PromptDetail};
pub use use_cases::compare_prompt::{
    ComparePromptError, ComparePromptInput, ComparePromptUseCase,
};
pub use use_cases::dispatch::{DispatchReport, Dispatcher};
pub use use_cases::manage_models::{ManageModelsError, ManageModelsUseCase};
pub use use_cases::manage_settings::{ManageSettingsError, ManageSettingsUseCase, SettingEntry};
pub use use_cases::resolve_config::{ConfigurationError, ConfigurationResolver, ResolvedRun};
pub use use_cases::save_prompt::{SavePromptError, SavePromptUseCase, SavedPrompt};
pub use use_cases::staging::{CommitError, RunHandle, StagingAggregator, StagingSnapshot};
