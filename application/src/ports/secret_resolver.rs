//! Secret resolver port
//!
//! Resolves a credential by name from a source outside the store.

use chatlist_domain::SecretRef;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),
}

/// Source of credentials referenced by [`SecretRef`].
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, name: &SecretRef) -> Result<String, SecretError>;
}
