//! Catalog store port: model and setting management.

use crate::ports::chat_store::StoreError;
use async_trait::async_trait;
use chatlist_domain::{ModelDefinition, ModelId, NewModel};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All models ordered by name
    async fn list_models(&self) -> Result<Vec<ModelDefinition>, StoreError>;

    async fn get_model(&self, id: ModelId) -> Result<Option<ModelDefinition>, StoreError>;

    /// Fails with [`StoreError::Constraint`] when the name is taken.
    async fn create_model(&self, model: &NewModel) -> Result<ModelId, StoreError>;

    /// Returns `false` when no row matched.
    async fn update_model(&self, model: &ModelDefinition) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Constraint`] while results reference the model.
    async fn delete_model(&self, id: ModelId) -> Result<bool, StoreError>;

    /// Insert or replace a setting value.
    async fn write_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// All settings ordered by key
    async fn list_settings(&self) -> Result<Vec<(String, String)>, StoreError>;
}
