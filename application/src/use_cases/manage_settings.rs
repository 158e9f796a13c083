//! Manage Settings use case
//!
//! Settings are opaque strings in the store. Keys the dispatcher reads are
//! validated on write so a typo cannot silently push a run onto defaults.

use crate::ports::catalog_store::CatalogStore;
use crate::ports::chat_store::StoreError;
use chatlist_domain::policy::setting_key;
use chatlist_domain::{DomainError, lookup_key};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ManageSettingsError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// One stored setting, with its description when the key is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
    pub description: Option<&'static str>,
}

pub struct ManageSettingsUseCase<S: CatalogStore + 'static> {
    store: Arc<S>,
}

impl<S: CatalogStore + 'static> ManageSettingsUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SettingEntry>, ManageSettingsError> {
        Ok(self
            .store
            .list_settings()
            .await?
            .into_iter()
            .map(|(key, value)| SettingEntry {
                description: lookup_key(&key).map(|info| info.description),
                key,
                value,
            })
            .collect())
    }

    pub async fn get(&self, key: &str) -> Result<Option<SettingEntry>, ManageSettingsError> {
        Ok(self.list().await?.into_iter().find(|entry| entry.key == key))
    }

    /// Insert or replace a setting.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), ManageSettingsError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DomainError::InvalidSetting {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            }
            .into());
        }

        let value = value.trim();
        if let Some(info) = lookup_key(key)
            && setting_key::parse_numeric(info, value).is_none()
        {
            return Err(DomainError::InvalidSetting {
                key: key.to_string(),
                reason: format!("expected an integer >= {}, got {:?}", info.min, value),
            }
            .into());
        }

        self.store.write_setting(key, value).await?;
        info!("Setting {} = {}", key, value);
        Ok(())
    }
}
