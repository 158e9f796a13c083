//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod browse_history;
pub mod compare_prompt;
pub mod dispatch;
pub mod manage_models;
pub mod manage_settings;
pub mod resolve_config;
pub mod save_prompt;
pub mod staging;

#[cfg(test)]
pub(crate) mod testing;
