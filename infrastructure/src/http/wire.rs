//! Chat-completions wire format shared by every supported provider.

use chatlist_domain::ProviderKind;
use serde::{Deserialize, Serialize};

/// Sampling temperature sent with every request
pub const TEMPERATURE: f64 = 0.7;

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
pub struct ChatApiRequest<'a> {
    pub model: &'a str,
    pub messages: [ApiMessage<'a>; 1],
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatApiRequest<'a> {
    /// Single user turn addressed to the provider's default model
    pub fn user_prompt(provider: ProviderKind, prompt: &'a str) -> Self {
        Self {
            model: provider.default_model(),
            messages: [ApiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Answer text of a successful response: `choices[0].message.content`.
///
/// Returns `Err` with a short description when the body does not carry one.
pub fn extract_answer(body: &str) -> Result<String, String> {
    let parsed: ChatApiResponse =
        serde_json::from_str(body).map_err(|e| format!("malformed response body: {e}"))?;

    parsed
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| match parsed.error.and_then(|e| e.message) {
            Some(message) => message,
            None => "response has no message content".to_string(),
        })
}

/// Human readable detail of an error response.
///
/// Prefers `error.message` from a JSON body, otherwise the (truncated) raw body.
pub fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ChatApiResponse>(body)
        && let Some(message) = parsed.error.and_then(|e| e.message)
    {
        return message;
    }

    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
