//! HTTP chat-completion client.
//!
//! Targets any **OpenAI-compatible** Chat Completions endpoint — a local
//! Ollama by default.  Non-streaming only: the classifier and extractor
//! need the full reply before they can act on it.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use valet_core::LlmSettings;

use crate::error::{LlmError, LlmResult};
use crate::types::Message;

/// Bound on every outbound chat call.  A timeout surfaces as
/// [`LlmError::RequestFailed`], the hard-error branch of the turn pipeline.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// The chat-completion collaborator: ordered messages in, one text reply out.
///
/// Implemented by [`HttpChatClient`] in production and by scripted fakes in
/// tests.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send the messages and return the model's reply text.
    async fn complete(&self, messages: &[Message]) -> LlmResult<String>;
}

/// Chat client for OpenAI-compatible `/v1/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl HttpChatClient {
    /// Create a client from the LLM settings.
    pub fn new(settings: &LlmSettings) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            http,
        })
    }
}

#[async_trait]
impl ChatCompletion for HttpChatClient {
    async fn complete(&self, messages: &[Message]) -> LlmResult<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
        });

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, count = messages.len(), "sending chat request");

        let resp = self.http.post(&url).json(&body).send().await?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| LlmError::RequestFailed {
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(LlmError::RequestFailed {
                reason: format!("API returned {status}: {text}"),
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| LlmError::ParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })?;

        parse_completion_response(&v)
    }
}

/// Pull the reply text out of a Chat Completions response envelope.
fn parse_completion_response(v: &Value) -> LlmResult<String> {
    v["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| LlmError::ParseFailed {
            reason: "missing choices[0].message.content in response".into(),
        })
}
