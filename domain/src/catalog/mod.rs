//! Model catalog: the configured AI endpoints a prompt is dispatched to.

pub mod entities;
pub mod provider;
