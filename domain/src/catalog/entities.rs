//! Model catalog entities

use crate::core::error::DomainError;
use crate::core::ids::ModelId;
use serde::{Deserialize, Serialize};

/// Name of an externally resolved credential (Value Object)
///
/// Stored in the `api_id` column. Only the *name* of the secret ever lives in
/// the store; the credential itself is resolved at call time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A configured model endpoint (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub id: ModelId,
    /// Unique display name
    pub name: String,
    /// Endpoint the chat request is POSTed to
    pub api_url: String,
    /// Credential reference
    pub secret: SecretRef,
    pub is_active: bool,
}

impl ModelDefinition {
    pub fn new(
        id: ModelId,
        name: impl Into<String>,
        api_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            api_url: api_url.into(),
            secret: SecretRef::new(secret),
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl std::fmt::Display for ModelDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Fields of a model that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModel {
    pub name: String,
    pub api_url: String,
    pub secret: SecretRef,
    pub is_active: bool,
}

impl NewModel {
    /// Build and validate a new model definition.
    pub fn try_new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let model = Self {
            name: name.into().trim().to_string(),
            api_url: api_url.into().trim().to_string(),
            secret: SecretRef::new(secret.into().trim()),
            is_active: true,
        };
        validate_fields(&model.name, &model.api_url, model.secret.as_str())?;
        Ok(model)
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

/// Partial update of a stored model. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelPatch {
    pub name: Option<String>,
    pub api_url: Option<String>,
    pub secret: Option<SecretRef>,
    pub is_active: Option<bool>,
}

impl ModelPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.api_url.is_none()
            && self.secret.is_none()
            && self.is_active.is_none()
    }

    /// Apply the patch on top of `current`, validating the merged result.
    pub fn apply_to(&self, current: &ModelDefinition) -> Result<ModelDefinition, DomainError> {
        let merged = ModelDefinition {
            id: current.id,
            name: self
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.name)
                .to_string(),
            api_url: self
                .api_url
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.api_url)
                .to_string(),
            secret: self.secret.clone().unwrap_or_else(|| current.secret.clone()),
            is_active: self.is_active.unwrap_or(current.is_active),
        };
        validate_fields(&merged.name, &merged.api_url, merged.secret.as_str())?;
        Ok(merged)
    }
}

fn validate_fields(name: &str, api_url: &str, secret: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::EmptyModelName);
    }
    if api_url.trim().is_empty() {
        return Err(DomainError::EmptyApiUrl);
    }
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(DomainError::InvalidApiUrl(api_url.to_string()));
    }
    if secret.trim().is_empty() {
        return Err(DomainError::EmptySecretRef);
    }
    Ok(())
}
