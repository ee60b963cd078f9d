//! Remote document-workspace provider.
//!
//! Talks MCP-flavored JSON-RPC 2.0 over HTTP: `tools/list` enumerates the
//! operation set, `tools/call` invokes one.  Tool invocation failures come
//! back inside a result envelope marked `isError` with a human-readable
//! message; this module classifies those messages so the dispatch layer can
//! tell "a named field was rejected" apart from everything else.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use valet_core::{TaskSlots, WorkspaceSettings};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{CapabilityProvider, ToolDescriptor};

/// Bound on every workspace call; a timeout is an ordinary invocation
/// failure and takes the fallback path.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Storage format for due dates in the page property map.
const DUE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Phrases that mark an error message as "this payload field is not
/// accepted", checked case-insensitively.
const UNKNOWN_FIELD_MARKERS: &[&str] = &[
    "is not a property",
    "unknown property",
    "unknown field",
    "unexpected property",
    "unexpected field",
    "unrecognized key",
    "not accepted",
];

/// MCP-style workspace client.
#[derive(Debug)]
pub struct McpWorkspace {
    endpoint: Url,
    token: String,
    database_id: String,
    http: reqwest::Client,
}

impl McpWorkspace {
    /// Create a workspace client from settings.
    pub fn new(settings: &WorkspaceSettings) -> ProviderResult<Self> {
        let endpoint = Url::parse(&settings.url).map_err(|e| ProviderError::Config {
            reason: format!("invalid workspace URL '{}': {e}", settings.url),
        })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            endpoint,
            token: settings.token.clone(),
            database_id: settings.database_id.clone(),
            http,
        })
    }

    /// Issue one JSON-RPC request and return the `result` value.
    async fn rpc(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Invocation {
                tool: method.to_string(),
                reason: format!("workspace returned {status}: {text}"),
            });
        }

        let envelope: Value = resp.json().await?;
        if let Some(err) = envelope.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown JSON-RPC error");
            return Err(ProviderError::Invocation {
                tool: method.to_string(),
                reason: message.to_string(),
            });
        }

        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl CapabilityProvider for McpWorkspace {
    fn id(&self) -> &str {
        "workspace"
    }

    async fn discover(&self) -> ProviderResult<Vec<ToolDescriptor>> {
        let result = self
            .rpc("tools/list", json!({}))
            .await
            .map_err(|e| ProviderError::Discovery {
                reason: e.to_string(),
            })?;

        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| {
                        let name = t.get("name")?.as_str()?.to_string();
                        let description = t
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        Some(ToolDescriptor { name, description })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        debug!(count = tools.len(), "workspace tools discovered");
        Ok(tools)
    }

    async fn invoke(&self, tool: &str, payload: Value) -> ProviderResult<Value> {
        let result = self
            .rpc("tools/call", json!({ "name": tool, "arguments": payload }))
            .await?;

        // Tool-level failures ride inside a successful RPC result, marked
        // by `isError` plus message text in the content blocks.
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            let message = envelope_text(&result);
            warn!(tool, message = %message, "workspace invocation failed");
            return Err(classify_invocation_error(tool, &message));
        }

        Ok(result)
    }

    fn task_payload(&self, slots: &TaskSlots) -> Value {
        let mut properties = json!({
            "Name": { "title": [ { "text": { "content": slots.text } } ] },
        });
        if let Some(due) = slots.due {
            properties["Due"] = json!({
                "date": { "start": due.format(DUE_FORMAT).to_string() }
            });
        }

        json!({
            "parent": { "database_id": self.database_id },
            "properties": properties,
        })
    }
}

/// Concatenate the text blocks of a tool-call result envelope.
fn envelope_text(result: &Value) -> String {
    result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "tool reported an error without a message".to_string())
}

/// Decide whether an error message means "a named field was rejected".
fn classify_invocation_error(tool: &str, message: &str) -> ProviderError {
    match rejected_field(message) {
        Some(field) => ProviderError::UnknownField { field },
        None => ProviderError::Invocation {
            tool: tool.to_string(),
            reason: message.to_string(),
        },
    }
}

/// Extract the rejected field name from an unknown-field error message.
///
/// Handles the phrasings observed in the wild: a quoted name anywhere in
/// the message, or the `X is not a property ...` form where the name leads
/// the sentence.
fn rejected_field(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    if !UNKNOWN_FIELD_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }

    if let Some(field) = quoted_token(message) {
        return Some(field);
    }

    // `Due is not a property that exists` — take the word before the marker.
    if let Some(pos) = lower.find(" is not a property") {
        let head = &message[..pos];
        if let Some(word) = head.split_whitespace().last() {
            return Some(word.trim_matches(|c: char| !c.is_alphanumeric()).to_string());
        }
    }

    None
}

/// First token wrapped in matching quotes (`"`, `'`, or backticks).
fn quoted_token(message: &str) -> Option<String> {
    for quote in ['"', '\'', '`'] {
        let mut parts = message.split(quote);
        parts.next()?;
        if let Some(inner) = parts.next() {
            let inner = inner.trim();
            if !inner.is_empty() && inner.len() < 64 {
                return Some(inner.to_string());
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
