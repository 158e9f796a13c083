//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod catalog_store;
pub mod chat_store;
pub mod history_store;
pub mod model_client;
pub mod progress;
pub mod run_logger;
pub mod secret_resolver;
