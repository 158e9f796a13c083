//! Resolves secret references from process environment variables.

use chatlist_application::ports::secret_resolver::{SecretError, SecretResolver};
use chatlist_domain::SecretRef;
use std::collections::HashMap;

/// Looks up `api_id` as an environment variable name.
///
/// An override map takes precedence over the process environment, so tests
/// and embedders can inject credentials without touching global state.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretResolver {
    overrides: HashMap<String, String>,
}

impl EnvSecretResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }
}

impl SecretResolver for EnvSecretResolver {
    fn resolve(&self, name: &SecretRef) -> Result<String, SecretError> {
        let value = match self.overrides.get(name.as_str()) {
            Some(value) => Some(value.clone()),
            None => std::env::var(name.as_str()).ok(),
        };

        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SecretError::NotFound(name.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let resolver = EnvSecretResolver::new().with_override("CHATLIST_TEST_KEY", " sk-1 ");
        assert_eq!(
            resolver.resolve(&SecretRef::new("CHATLIST_TEST_KEY")).unwrap(),
            "sk-1"
        );
    }

    #[test]
    fn test_missing_and_blank_are_not_found() {
        let resolver = EnvSecretResolver::new().with_override("CHATLIST_BLANK_KEY", "   ");
        assert!(matches!(
            resolver.resolve(&SecretRef::new("CHATLIST_BLANK_KEY")),
            Err(SecretError::NotFound(name)) if name == "CHATLIST_BLANK_KEY"
        ));
        assert!(
            resolver
                .resolve(&SecretRef::new("CHATLIST_SURELY_UNSET_VARIABLE_42"))
                .is_err()
        );
    }

    #[test]
    fn test_reads_process_environment() {
        // PATH is set in every test environment
        let resolver = EnvSecretResolver::new();
        assert!(resolver.resolve(&SecretRef::new("PATH")).is_ok());
    }
}
