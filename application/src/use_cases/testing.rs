//! Test doubles shared by the use case tests.

use crate::ports::catalog_store::CatalogStore;
use crate::ports::chat_store::{
    ChatStore, CommitBatch, CommitReceipt, PromptRef, StoreError,
};
use crate::ports::history_store::{HistoryStore, ResultFilter};
use crate::ports::model_client::{CallError, ModelClient};
use async_trait::async_trait;
use chatlist_domain::{
    ModelDefinition, ModelId, NewModel, Prompt, PromptId, PromptText, ResultId, ResultRecord,
    StoredResult, Tags,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn model(id: i64, name: &str) -> ModelDefinition {
    ModelDefinition::new(
        ModelId::new(id),
        name,
        format!("https://{name}.example.com/v1/chat/completions"),
        format!("{}_KEY", name.to_uppercase()),
    )
}

// ==================== Fake Model Client ====================

/// One scripted reaction of the fake client
#[derive(Clone)]
pub(crate) enum Step {
    Reply(String),
    Fail(CallError),
    /// Reply after a delay
    Slow(Duration, String),
    /// Never answer
    Hang,
}

pub(crate) fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

#[derive(Default)]
pub(crate) struct FakeClient {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, model: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), steps.into());
        self
    }

    pub(crate) fn calls(&self, model: &str) -> u32 {
        self.calls.lock().unwrap().get(model).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ModelClient for FakeClient {
    async fn send(
        &self,
        model: &ModelDefinition,
        _prompt: &str,
        _deadline: Duration,
    ) -> Result<String, CallError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(model.name.clone())
            .or_default() += 1;
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&model.name)
            .and_then(|steps| steps.pop_front());

        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Slow(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Step::Hang) => std::future::pending().await,
            None => Err(CallError::provider(None, "script exhausted")),
        }
    }
}

// ==================== In-memory Store ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResultRow {
    pub id: ResultId,
    pub prompt_id: PromptId,
    pub model_id: ModelId,
    pub response_text: String,
}

#[derive(Default)]
struct Inner {
    models: Vec<ModelDefinition>,
    settings: HashMap<String, String>,
    prompts: Vec<(PromptId, String, Tags)>,
    results: Vec<ResultRow>,
    next_id: i64,
    fail_next_commit: bool,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn prompt_by_text(&self, text: &str) -> Option<PromptId> {
        self.prompts
            .iter()
            .filter(|(_, stored, _)| stored == text)
            .map(|(id, _, _)| *id)
            .min()
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_models(self, models: Vec<ModelDefinition>) -> Self {
        self.inner.lock().unwrap().models = models;
        self
    }

    pub(crate) fn with_setting(self, key: &str, value: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn fail_next_commit(&self) {
        self.inner.lock().unwrap().fail_next_commit = true;
    }

    pub(crate) fn prompts(&self) -> Vec<(PromptId, String, Tags)> {
        self.inner.lock().unwrap().prompts.clone()
    }

    pub(crate) fn results(&self) -> Vec<ResultRow> {
        self.inner.lock().unwrap().results.clone()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn read_active_models(&self) -> Result<Vec<ModelDefinition>, StoreError> {
        let mut models: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .models
            .iter()
            .filter(|m| m.is_active)
            .cloned()
            .collect();
        models.sort_by_key(|m| m.id);
        Ok(models)
    }

    async fn read_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().unwrap().settings.get(key).cloned())
    }

    async fn insert_prompt(&self, text: &PromptText, tags: &Tags) -> Result<PromptId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = PromptId::new(inner.next_id());
        inner
            .prompts
            .push((id, text.as_str().to_string(), tags.clone()));
        Ok(id)
    }

    async fn find_prompt_by_text(&self, text: &PromptText) -> Result<Option<PromptId>, StoreError> {
        Ok(self.inner.lock().unwrap().prompt_by_text(text.as_str()))
    }

    async fn insert_result(
        &self,
        prompt_id: PromptId,
        model_id: ModelId,
        response_text: &str,
    ) -> Result<ResultId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = ResultId::new(inner.next_id());
        inner.results.push(ResultRow {
            id,
            prompt_id,
            model_id,
            response_text: response_text.to_string(),
        });
        Ok(id)
    }

    async fn commit(&self, batch: CommitBatch) -> Result<CommitReceipt, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if std::mem::take(&mut inner.fail_next_commit) {
            return Err(StoreError::Backend("disk I/O error".to_string()));
        }
        let prompt_id = match batch.prompt {
            PromptRef::Existing(id) => id,
            PromptRef::New { text, tags } => {
                let existing = inner.prompt_by_text(text.as_str());
                match existing {
                    Some(id) => id,
                    None => {
                        let id = PromptId::new(inner.next_id());
                        inner.prompts.push((id, text.as_str().to_string(), tags));
                        id
                    }
                }
            }
        };
        let mut result_ids = Vec::new();
        for result in batch.results {
            let id = ResultId::new(inner.next_id());
            inner.results.push(ResultRow {
                id,
                prompt_id,
                model_id: result.model_id,
                response_text: result.response_text,
            });
            result_ids.push(id);
        }
        Ok(CommitReceipt {
            prompt_id,
            result_ids,
        })
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_models(&self) -> Result<Vec<ModelDefinition>, StoreError> {
        let mut models = self.inner.lock().unwrap().models.clone();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    async fn get_model(&self, id: ModelId) -> Result<Option<ModelDefinition>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .models
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn create_model(&self, model: &NewModel) -> Result<ModelId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.models.iter().any(|m| m.name == model.name) {
            return Err(StoreError::Constraint(
                "UNIQUE constraint failed: models.name".to_string(),
            ));
        }
        let id = ModelId::new(inner.next_id());
        let mut stored =
            ModelDefinition::new(id, &model.name, &model.api_url, model.secret.as_str());
        stored.is_active = model.is_active;
        inner.models.push(stored);
        Ok(id)
    }

    async fn update_model(&self, model: &ModelDefinition) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.models.iter_mut().find(|m| m.id == model.id) {
            Some(slot) => {
                *slot = model.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_model(&self, id: ModelId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.results.iter().any(|r| r.model_id == id) {
            return Err(StoreError::Constraint(
                "FOREIGN KEY constraint failed".to_string(),
            ));
        }
        let before = inner.models.len();
        inner.models.retain(|m| m.id != id);
        Ok(inner.models.len() != before)
    }

    async fn write_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut settings: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .settings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        settings.sort();
        Ok(settings)
    }
}

/// Ids grow monotonically, so deriving the timestamp from the id keeps
/// "newest first" deterministic.
fn stamp(id: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + id, 0)
        .single()
        .unwrap_or_default()
}

impl Inner {
    fn prompt(&self, id: PromptId) -> Option<Prompt> {
        self.prompts
            .iter()
            .find(|(pid, _, _)| *pid == id)
            .map(|(pid, text, tags)| Prompt {
                id: *pid,
                created_at: stamp(pid.get()),
                text: text.clone(),
                tags: tags.clone(),
            })
    }

    fn record(&self, row: &ResultRow) -> Option<ResultRecord> {
        let prompt = self.prompt(row.prompt_id)?;
        let model = self.models.iter().find(|m| m.id == row.model_id)?;
        Some(ResultRecord {
            result: StoredResult {
                id: row.id,
                prompt_id: row.prompt_id,
                model_id: row.model_id,
                response_text: row.response_text.clone(),
                created_at: stamp(row.id.get()),
            },
            prompt_text: prompt.text,
            tags: prompt.tags,
            model_name: model.name.clone(),
        })
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, StoreError> {
        self.search_prompts("").await
    }

    async fn get_prompt(&self, id: PromptId) -> Result<Option<Prompt>, StoreError> {
        Ok(self.inner.lock().unwrap().prompt(id))
    }

    async fn search_prompts(&self, query: &str) -> Result<Vec<Prompt>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut prompts: Vec<_> = inner
            .prompts
            .iter()
            .filter(|(_, text, tags)| {
                text.contains(query) || tags.iter().any(|t| t.contains(query))
            })
            .filter_map(|(id, _, _)| inner.prompt(*id))
            .collect();
        prompts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(prompts)
    }

    async fn delete_prompt(&self, id: PromptId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.prompts.len();
        inner.prompts.retain(|(pid, _, _)| *pid != id);
        inner.results.retain(|r| r.prompt_id != id);
        Ok(inner.prompts.len() != before)
    }

    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<ResultRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<_> = inner
            .results
            .iter()
            .filter_map(|row| inner.record(row))
            .filter(|record| match filter {
                ResultFilter::All => true,
                ResultFilter::ForPrompt(id) => record.result.prompt_id == *id,
                ResultFilter::Matching(q) => {
                    record.result.response_text.contains(q.as_str())
                        || record.prompt_text.contains(q.as_str())
                        || record.model_name.contains(q.as_str())
                }
            })
            .collect();
        records.sort_by(|a, b| b.id().cmp(&a.id()));
        Ok(records)
    }

    async fn delete_result(&self, id: ResultId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.results.len();
        inner.results.retain(|r| r.id != id);
        Ok(inner.results.len() != before)
    }
}
