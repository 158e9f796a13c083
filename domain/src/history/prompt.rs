//! Prompt value object and entity

use crate::core::error::DomainError;
use crate::core::ids::PromptId;
use crate::history::tags::Tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated prompt text (Value Object)
///
/// Surrounding whitespace is stripped; the remaining text must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptText {
    content: String,
}

impl PromptText {
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            Err(DomainError::EmptyPrompt)
        } else {
            Ok(Self { content })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for PromptText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<&str> for PromptText {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

/// A stored prompt (Entity). Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub tags: Tags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_trims() {
        let p = PromptText::try_new("  What is Rust?\n").unwrap();
        assert_eq!(p.as_str(), "What is Rust?");
    }

    #[test]
    fn test_prompt_text_rejects_blank() {
        assert_eq!(PromptText::try_new("").unwrap_err(), DomainError::EmptyPrompt);
        assert_eq!(PromptText::try_new(" \t ").unwrap_err(), DomainError::EmptyPrompt);
        assert!(PromptText::try_from("hi").is_ok());
    }
}
