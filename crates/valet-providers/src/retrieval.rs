//! Retrieval-augmented answering.
//!
//! The vector-search side is a black box: the retrieval service accepts raw
//! question text and returns ranked text snippets with identifiers.  This
//! module stitches those snippets into a context block and asks the chat
//! collaborator for the final answer.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use valet_core::RetrievalSettings;
use valet_llm::{ChatCompletion, Message};

use crate::error::{ProviderError, ProviderResult};

/// Bound on every retrieval call.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// System instruction for the QA path.
const QA_PROMPT: &str = "\
You are a concise personal assistant.
Use the provided context only as factual background.
Always answer the user's question directly and do not ask follow-up \
questions about their goals or intentions unless absolutely necessary.";

/// A ranked snippet returned by the retrieval service.
#[derive(Debug, Clone, Deserialize)]
pub struct Snippet {
    /// Document identifier.
    pub id: String,
    /// Snippet text.
    pub text: String,
}

/// The answer produced for a question, with its supporting document ids.
#[derive(Debug, Clone)]
pub struct RetrievedAnswer {
    /// Final reply text.
    pub reply: String,
    /// Identifiers of the supporting documents, in rank order.
    pub doc_ids: Vec<String>,
}

/// The question-answering collaborator.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Answer a raw question.
    async fn answer(&self, question: &str) -> ProviderResult<RetrievedAnswer>;
}

/// Retrieval-augmented answerer over an HTTP search service plus the chat
/// collaborator.
pub struct RetrievalAnswerer {
    search_url: Url,
    collection: String,
    top_k: usize,
    chat: Arc<dyn ChatCompletion>,
    http: reqwest::Client,
}

impl RetrievalAnswerer {
    /// Create an answerer from settings and a chat collaborator.
    pub fn new(
        settings: &RetrievalSettings,
        chat: Arc<dyn ChatCompletion>,
    ) -> ProviderResult<Self> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let search_url = Url::parse(&base)
            .and_then(|u| u.join("search"))
            .map_err(|e| ProviderError::Config {
                reason: format!("invalid retrieval URL '{}': {e}", settings.base_url),
            })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            search_url,
            collection: settings.collection.clone(),
            top_k: settings.top_k,
            chat,
            http,
        })
    }

    /// Query the retrieval service for ranked snippets.
    ///
    /// A failing or unreachable retrieval service degrades to an empty
    /// snippet list: the question is still answered, just without notes
    /// context.
    async fn search(&self, query: &str) -> Vec<Snippet> {
        let body = json!({
            "collection": self.collection,
            "query": query,
            "limit": self.top_k,
        });

        let resp = match self.http.post(self.search_url.clone()).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "retrieval service unreachable, answering without context");
                return Vec::new();
            }
        };

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "retrieval search failed, answering without context");
            return Vec::new();
        }

        match resp.json::<Value>().await {
            Ok(v) => parse_snippets(&v),
            Err(e) => {
                warn!(error = %e, "unparseable retrieval response, answering without context");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl QuestionAnswerer for RetrievalAnswerer {
    async fn answer(&self, question: &str) -> ProviderResult<RetrievedAnswer> {
        let snippets = self.search(question).await;
        let doc_ids: Vec<String> = snippets.iter().map(|s| s.id.clone()).collect();
        let context = snippets
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(retrieved = doc_ids.len(), "answering with retrieved context");

        let messages = [
            Message::system(QA_PROMPT),
            Message::user(format!("Context:\n{context}\n\nQuestion: {question}")),
        ];
        let reply = self.chat.complete(&messages).await?;

        Ok(RetrievedAnswer { reply, doc_ids })
    }
}

/// Pull `{ id, text }` snippets out of the search response, tolerating
/// numeric ids.
fn parse_snippets(v: &Value) -> Vec<Snippet> {
    v.get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = match item.get("id") {
                        Some(Value::String(s)) => s.clone(),
                        Some(Value::Number(n)) => n.to_string(),
                        _ => return None,
                    };
                    let text = item.get("text").and_then(Value::as_str)?.to_string();
                    Some(Snippet { id, text })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_prompt_stays_direct() {
        assert!(QA_PROMPT.contains("concise personal assistant"));
        assert!(QA_PROMPT.contains("answer the user's question directly"));
    }

    #[test]
    fn snippets_parse_with_string_and_numeric_ids() {
        let v = json!({
            "results": [
                {"id": "notes/rust.md", "text": "Rust is fine."},
                {"id": 42, "text": "So is SQLite."},
                {"id": null, "text": "dropped"},
                {"text": "no id, dropped"}
            ]
        });
        let snippets = parse_snippets(&v);
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].id, "notes/rust.md");
        assert_eq!(snippets[1].id, "42");
    }

    #[test]
    fn missing_results_is_empty() {
        assert!(parse_snippets(&json!({})).is_empty());
    }
}
