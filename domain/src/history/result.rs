//! Committed results

use crate::core::ids::{ModelId, PromptId, ResultId};
use crate::history::tags::Tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A result row as stored (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: ResultId,
    pub prompt_id: PromptId,
    pub model_id: ModelId,
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

/// A result joined with its prompt and model, as shown in history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub result: StoredResult,
    pub prompt_text: String,
    pub tags: Tags,
    pub model_name: String,
}

impl ResultRecord {
    pub fn id(&self) -> ResultId {
        self.result.id
    }
}
