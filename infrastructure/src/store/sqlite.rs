//! rusqlite adapter for the store ports.

use super::schema::{PRAGMAS, SCHEMA};
use async_trait::async_trait;
use chatlist_application::ports::catalog_store::CatalogStore;
use chatlist_application::ports::chat_store::{
    ChatStore, CommitBatch, CommitReceipt, PromptRef, StoreError,
};
use chatlist_application::ports::history_store::{HistoryStore, ResultFilter};
use chatlist_domain::{
    ModelDefinition, ModelId, NewModel, Prompt, PromptId, PromptText, ResultId, ResultRecord,
    StoredResult, Tags,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

const MODEL_COLUMNS: &str = "id, name, api_url, api_id, is_active";
const PROMPT_COLUMNS: &str = "id, date, prompt, tags";
const RECORD_SELECT: &str = "\
    SELECT r.id, r.prompt_id, r.model_id, r.response_text, r.created_at, p.prompt, p.tags, m.name \
    FROM results r \
    JOIN prompts p ON p.id = r.prompt_id \
    JOIN models m ON m.id = r.model_id";

#[derive(Clone)]
pub struct SqliteChatStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteChatStore {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let conn = Connection::open(&path).map_err(into_store_error)?;
        debug!("Opened database {}", path.display());
        Self::init(conn, Some(path))
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(into_store_error)?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(PRAGMAS).map_err(into_store_error)?;
        conn.execute_batch(SCHEMA).map_err(into_store_error)?;
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<R>,
    {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut guard).map_err(into_store_error)
    }

    /// Run `f` on the blocking pool.
    async fn blocking<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

fn into_store_error(error: rusqlite::Error) -> StoreError {
    match &error {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Constraint(error.to_string())
        }
        _ => StoreError::Backend(error.to_string()),
    }
}

// ==================== Row mapping ====================

fn model_from_row(row: &Row<'_>) -> rusqlite::Result<ModelDefinition> {
    let mut model = ModelDefinition::new(
        ModelId::new(row.get(0)?),
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
    );
    model.is_active = row.get(4)?;
    Ok(model)
}

fn prompt_from_row(row: &Row<'_>) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: PromptId::new(row.get(0)?),
        created_at: row.get::<_, DateTime<Utc>>(1)?,
        text: row.get(2)?,
        tags: Tags::parse(row.get::<_, Option<String>>(3)?.as_deref()),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ResultRecord> {
    Ok(ResultRecord {
        result: StoredResult {
            id: ResultId::new(row.get(0)?),
            prompt_id: PromptId::new(row.get(1)?),
            model_id: ModelId::new(row.get(2)?),
            response_text: row.get(3)?,
            created_at: row.get::<_, DateTime<Utc>>(4)?,
        },
        prompt_text: row.get(5)?,
        tags: Tags::parse(row.get::<_, Option<String>>(6)?.as_deref()),
        model_name: row.get(7)?,
    })
}

fn like_pattern(query: &str) -> String {
    format!("%{}%", query.trim())
}

// ==================== Writes shared by single inserts and commit ====================

fn insert_prompt_row(conn: &Connection, text: &str, tags: &Tags) -> rusqlite::Result<PromptId> {
    conn.execute(
        "INSERT INTO prompts (date, prompt, tags) VALUES (?1, ?2, ?3)",
        params![Utc::now(), text, tags.to_column()],
    )?;
    Ok(PromptId::new(conn.last_insert_rowid()))
}

fn find_prompt_row(conn: &Connection, text: &str) -> rusqlite::Result<Option<PromptId>> {
    conn.query_row(
        "SELECT id FROM prompts WHERE prompt = ?1 ORDER BY id LIMIT 1",
        params![text],
        |row| row.get(0).map(PromptId::new),
    )
    .optional()
}

fn insert_result_row(
    conn: &Connection,
    prompt_id: PromptId,
    model_id: ModelId,
    response_text: &str,
) -> rusqlite::Result<ResultId> {
    conn.execute(
        "INSERT INTO results (prompt_id, model_id, response_text, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![prompt_id.get(), model_id.get(), response_text, Utc::now()],
    )?;
    Ok(ResultId::new(conn.last_insert_rowid()))
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn read_active_models(&self) -> Result<Vec<ModelDefinition>, StoreError> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MODEL_COLUMNS} FROM models WHERE is_active = 1 ORDER BY id"
            ))?;
            let models = stmt.query_map([], model_from_row)?.collect();
            models
        })
        .await
    }

    async fn read_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.blocking(move |conn| {
            let value: Option<Option<String>> = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value.flatten())
        })
        .await
    }

    async fn insert_prompt(&self, text: &PromptText, tags: &Tags) -> Result<PromptId, StoreError> {
        let text = text.as_str().to_string();
        let tags = tags.clone();
        self.blocking(move |conn| insert_prompt_row(conn, &text, &tags))
            .await
    }

    async fn find_prompt_by_text(&self, text: &PromptText) -> Result<Option<PromptId>, StoreError> {
        let text = text.as_str().to_string();
        self.blocking(move |conn| find_prompt_row(conn, &text)).await
    }

    async fn insert_result(
        &self,
        prompt_id: PromptId,
        model_id: ModelId,
        response_text: &str,
    ) -> Result<ResultId, StoreError> {
        let response_text = response_text.to_string();
        self.blocking(move |conn| insert_result_row(conn, prompt_id, model_id, &response_text))
            .await
    }

    async fn commit(&self, batch: CommitBatch) -> Result<CommitReceipt, StoreError> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let prompt_id = match &batch.prompt {
                PromptRef::Existing(id) => *id,
                PromptRef::New { text, tags } => match find_prompt_row(&tx, text.as_str())? {
                    Some(id) => id,
                    None => insert_prompt_row(&tx, text.as_str(), tags)?,
                },
            };
            let result_ids = batch
                .results
                .iter()
                .map(|r| insert_result_row(&tx, prompt_id, r.model_id, &r.response_text))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            // dropping an uncommitted transaction rolls it back
            tx.commit()?;
            Ok(CommitReceipt {
                prompt_id,
                result_ids,
            })
        })
        .await
    }
}

#[async_trait]
impl CatalogStore for SqliteChatStore {
    async fn list_models(&self) -> Result<Vec<ModelDefinition>, StoreError> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {MODEL_COLUMNS} FROM models ORDER BY name"))?;
            let models = stmt.query_map([], model_from_row)?.collect();
            models
        })
        .await
    }

    async fn get_model(&self, id: ModelId) -> Result<Option<ModelDefinition>, StoreError> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = ?1"),
                params![id.get()],
                model_from_row,
            )
            .optional()
        })
        .await
    }

    async fn create_model(&self, model: &NewModel) -> Result<ModelId, StoreError> {
        let model = model.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO models (name, api_url, api_id, is_active) VALUES (?1, ?2, ?3, ?4)",
                params![model.name, model.api_url, model.secret.as_str(), model.is_active],
            )?;
            Ok(ModelId::new(conn.last_insert_rowid()))
        })
        .await
    }

    async fn update_model(&self, model: &ModelDefinition) -> Result<bool, StoreError> {
        let model = model.clone();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE models SET name = ?1, api_url = ?2, api_id = ?3, is_active = ?4 \
                 WHERE id = ?5",
                params![
                    model.name,
                    model.api_url,
                    model.secret.as_str(),
                    model.is_active,
                    model.id.get()
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_model(&self, id: ModelId) -> Result<bool, StoreError> {
        self.blocking(move |conn| {
            let changed = conn.execute("DELETE FROM models WHERE id = ?1", params![id.get()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn write_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_settings(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
            let settings = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get::<_, Option<String>>(1)?.unwrap_or_default()))
                })?
                .collect();
            settings
        })
        .await
    }
}

#[async_trait]
impl HistoryStore for SqliteChatStore {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, StoreError> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROMPT_COLUMNS} FROM prompts ORDER BY date DESC, id DESC"
            ))?;
            let prompts = stmt.query_map([], prompt_from_row)?.collect();
            prompts
        })
        .await
    }

    async fn get_prompt(&self, id: PromptId) -> Result<Option<Prompt>, StoreError> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?1"),
                params![id.get()],
                prompt_from_row,
            )
            .optional()
        })
        .await
    }

    async fn search_prompts(&self, query: &str) -> Result<Vec<Prompt>, StoreError> {
        let pattern = like_pattern(query);
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROMPT_COLUMNS} FROM prompts \
                 WHERE prompt LIKE ?1 OR tags LIKE ?1 ORDER BY date DESC, id DESC"
            ))?;
            let prompts = stmt.query_map(params![pattern], prompt_from_row)?.collect();
            prompts
        })
        .await
    }

    async fn delete_prompt(&self, id: PromptId) -> Result<bool, StoreError> {
        self.blocking(move |conn| {
            let changed = conn.execute("DELETE FROM prompts WHERE id = ?1", params![id.get()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<ResultRecord>, StoreError> {
        let filter = filter.clone();
        self.blocking(move |conn| {
            let order = "ORDER BY r.created_at DESC, r.id DESC";
            let records: rusqlite::Result<Vec<ResultRecord>> = match filter {
                ResultFilter::All => {
                    let mut stmt = conn.prepare(&format!("{RECORD_SELECT} {order}"))?;
                    let rows = stmt.query_map([], record_from_row)?.collect();
                    rows
                }
                ResultFilter::ForPrompt(id) => {
                    let mut stmt =
                        conn.prepare(&format!("{RECORD_SELECT} WHERE r.prompt_id = ?1 {order}"))?;
                    let rows = stmt.query_map(params![id.get()], record_from_row)?.collect();
                    rows
                }
                ResultFilter::Matching(query) => {
                    let mut stmt = conn.prepare(&format!(
                        "{RECORD_SELECT} \
                         WHERE r.response_text LIKE ?1 OR p.prompt LIKE ?1 OR m.name LIKE ?1 {order}"
                    ))?;
                    let rows = stmt
                        .query_map(params![like_pattern(&query)], record_from_row)?
                        .collect();
                    rows
                }
            };
            records
        })
        .await
    }

    async fn delete_result(&self, id: ResultId) -> Result<bool, StoreError> {
        self.blocking(move |conn| {
            let changed = conn.execute("DELETE FROM results WHERE id = ?1", params![id.get()])?;
            Ok(changed > 0)
        })
        .await
    }
}
