//! reqwest adapter for the `ModelClient` port.

use super::wire::{ChatApiRequest, error_detail, extract_answer};
use async_trait::async_trait;
use chatlist_application::ports::model_client::{CallError, ModelClient};
use chatlist_application::ports::secret_resolver::SecretResolver;
use chatlist_domain::{ModelDefinition, ProviderKind};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Cap on establishing a connection; the per-call deadline still applies.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stateless client sending one chat request per call.
///
/// The credential is resolved on every call, so a rotated environment
/// variable takes effect on the next attempt.
pub struct HttpModelClient<R: SecretResolver> {
    client: reqwest::Client,
    secrets: R,
}

impl<R: SecretResolver> HttpModelClient<R> {
    pub fn new(secrets: R) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(headers)
            .user_agent(concat!("chatlist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, secrets })
    }
}

fn classify(error: reqwest::Error, deadline: Duration) -> CallError {
    if error.is_timeout() {
        CallError::Timeout(deadline)
    } else {
        CallError::Transport(error.to_string())
    }
}

#[async_trait]
impl<R: SecretResolver> ModelClient for HttpModelClient<R> {
    async fn send(
        &self,
        model: &ModelDefinition,
        prompt: &str,
        deadline: Duration,
    ) -> Result<String, CallError> {
        let api_key = self
            .secrets
            .resolve(&model.secret)
            .map_err(|e| CallError::provider(None, e.to_string()))?;

        let provider = ProviderKind::detect(model);
        let request = ChatApiRequest::user_prompt(provider, prompt);
        debug!(
            "POST {} ({} provider, upstream model {})",
            model.api_url, provider, request.model
        );

        let response = self
            .client
            .post(&model.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| classify(e, deadline))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify(e, deadline))?;

        if !status.is_success() {
            return Err(CallError::provider(Some(status.as_u16()), error_detail(&body)));
        }

        extract_answer(&body).map_err(|detail| CallError::provider(Some(status.as_u16()), detail))
    }
}
