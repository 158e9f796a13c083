//! Manage Models use case
//!
//! CRUD over the model catalog. Field validation happens in the domain
//! (`NewModel`, `ModelPatch`); store constraint violations are mapped to
//! errors the caller can act on.

use crate::ports::catalog_store::CatalogStore;
use crate::ports::chat_store::StoreError;
use chatlist_domain::{DomainError, ModelDefinition, ModelId, ModelPatch, NewModel};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ManageModelsError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("Model {0} not found")]
    NotFound(ModelId),

    #[error("A model named '{0}' already exists")]
    NameTaken(String),

    #[error("Model {0} still has stored results; delete them first or deactivate the model")]
    InUse(ModelId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub struct ManageModelsUseCase<S: CatalogStore + 'static> {
    store: Arc<S>,
}

impl<S: CatalogStore + 'static> ManageModelsUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<ModelDefinition>, ManageModelsError> {
        Ok(self.store.list_models().await?)
    }

    pub async fn get(&self, id: ModelId) -> Result<ModelDefinition, ManageModelsError> {
        self.store
            .get_model(id)
            .await?
            .ok_or(ManageModelsError::NotFound(id))
    }

    pub async fn create(&self, model: NewModel) -> Result<ModelDefinition, ManageModelsError> {
        let id = match self.store.create_model(&model).await {
            Ok(id) => id,
            Err(StoreError::Constraint(_)) => return Err(ManageModelsError::NameTaken(model.name)),
            Err(e) => return Err(e.into()),
        };
        info!("Added model {} (#{})", model.name, id);

        let mut created = ModelDefinition::new(id, model.name, model.api_url, model.secret.as_str());
        created.is_active = model.is_active;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: ModelId,
        patch: ModelPatch,
    ) -> Result<ModelDefinition, ManageModelsError> {
        let current = self.get(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        let updated = patch.apply_to(&current)?;

        match self.store.update_model(&updated).await {
            Ok(true) => {}
            Ok(false) => return Err(ManageModelsError::NotFound(id)),
            Err(StoreError::Constraint(_)) => {
                return Err(ManageModelsError::NameTaken(updated.name));
            }
            Err(e) => return Err(e.into()),
        }
        info!("Updated model {}", updated);
        Ok(updated)
    }

    /// Flip the active flag.
    pub async fn toggle(&self, id: ModelId) -> Result<ModelDefinition, ManageModelsError> {
        let current = self.get(id).await?;
        self.set_active(id, !current.is_active).await
    }

    pub async fn set_active(
        &self,
        id: ModelId,
        active: bool,
    ) -> Result<ModelDefinition, ManageModelsError> {
        self.update(
            id,
            ModelPatch {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a model. Refused while any stored result references it.
    pub async fn delete(&self, id: ModelId) -> Result<(), ManageModelsError> {
        match self.store.delete_model(id).await {
            Ok(true) => {
                info!("Deleted model #{}", id);
                Ok(())
            }
            Ok(false) => Err(ManageModelsError::NotFound(id)),
            Err(StoreError::Constraint(_)) => Err(ManageModelsError::InUse(id)),
            Err(e) => Err(e.into()),
        }
    }
}
