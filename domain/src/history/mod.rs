//! Durable history: prompts and the results committed for them.

pub mod prompt;
pub mod result;
pub mod tags;
