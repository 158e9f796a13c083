//! Provider detection
//!
//! All supported providers speak the chat-completions wire format; they only
//! differ in the upstream model name requested when none is configured.

use crate::catalog::entities::ModelDefinition;
use serde::{Deserialize, Serialize};

/// Provider family of a model endpoint (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    Groq,
    /// Any other OpenAI-compatible endpoint
    Compatible,
}

impl ProviderKind {
    /// Detect the provider from the endpoint URL, then from the model name.
    pub fn detect(model: &ModelDefinition) -> Self {
        let url = model.api_url.to_lowercase();
        let name = model.name.to_lowercase();
        let mentions = |needle: &str| url.contains(needle) || name.contains(needle);

        if mentions("openai") {
            ProviderKind::OpenAi
        } else if mentions("deepseek") {
            ProviderKind::DeepSeek
        } else if mentions("groq") {
            ProviderKind::Groq
        } else {
            ProviderKind::Compatible
        }
    }

    /// Upstream model requested in the chat body.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi | ProviderKind::Compatible => "gpt-4",
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::Groq => "llama-3.1-70b-versatile",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Groq => "groq",
            ProviderKind::Compatible => "compatible",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::ModelId;

    fn model(name: &str, url: &str) -> ModelDefinition {
        ModelDefinition::new(ModelId::new(1), name, url, "KEY")
    }

    #[test]
    fn test_detect_from_url() {
        assert_eq!(
            ProviderKind::detect(&model("a", "https://api.openai.com/v1/chat/completions")),
            ProviderKind::OpenAi
        );
        assert_eq!(
            ProviderKind::detect(&model("a", "https://api.deepseek.com/chat/completions")),
            ProviderKind::DeepSeek
        );
        assert_eq!(
            ProviderKind::detect(&model("a", "https://api.groq.com/openai/v1/chat/completions")),
            ProviderKind::OpenAi
        );
    }

    #[test]
    fn test_detect_from_name_and_fallback() {
        assert_eq!(
            ProviderKind::detect(&model("Groq Llama", "http://localhost:9000")),
            ProviderKind::Groq
        );
        assert_eq!(
            ProviderKind::detect(&model("local", "http://localhost:9000")),
            ProviderKind::Compatible
        );
    }

    #[test]
    fn test_default_models() {
        assert_eq!(ProviderKind::DeepSeek.default_model(), "deepseek-chat");
        assert_eq!(ProviderKind::Groq.default_model(), "llama-3.1-70b-versatile");
        assert_eq!(ProviderKind::Compatible.default_model(), "gpt-4");
    }
}
