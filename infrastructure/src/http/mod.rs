//! HTTP model client
//!
//! [`HttpModelClient`] implements the `ModelClient` port over reqwest. The
//! chat-completions wire types live in [`wire`].

mod client;
pub mod wire;

pub use client::HttpModelClient;
