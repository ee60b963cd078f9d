//! REST API route handlers.
//!
//! `/health` for liveness, `/api/chat` for one-shot turns, `/api/todos`
//! for inspecting the local task list.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use valet_engine::EngineError;
use valet_llm::LlmError;
use valet_providers::ProviderError;
use valet_store::Todo;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// POST /api/chat
// ---------------------------------------------------------------------------

/// Request payload for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user utterance.
    pub message: String,
    /// Shared token, required when the server is configured with one.
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Response payload for the chat endpoint.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The final reply text.
    pub reply: String,
    /// Tool names invoked during the turn.
    pub used_tools: Vec<String>,
    /// Identifiers of documents retrieved for the reply.
    pub retrieved_doc_ids: Vec<String>,
}

/// Process one chat turn.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if let Some(expected) = &state.api_token {
        if payload.api_token.as_deref() != Some(expected.as_str()) {
            return Err(ApiError::Unauthorized);
        }
    }

    let result = state.engine.handle(&payload.message).await?;

    Ok(Json(ChatResponse {
        reply: result.reply,
        used_tools: result.tools_used,
        retrieved_doc_ids: result.retrieved_ids,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/todos
// ---------------------------------------------------------------------------

/// Query parameters for the todo listing.
#[derive(Debug, Deserialize)]
pub struct TodoQuery {
    /// Optional status filter (`open` or `done`).
    pub status: Option<String>,
}

/// List stored todos, newest first.
pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TodoQuery>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.todos.list(query.status.as_deref()).await?;
    Ok(Json(todos))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// HTTP-facing error with the right status per failure class.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or mismatched API token.
    Unauthorized,
    /// A rejected turn: malformed explicit command, corrective message.
    BadRequest(String),
    /// An upstream collaborator is unreachable.
    Upstream(String),
    /// Everything else.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid API token".to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(msg) => {
                warn!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        if err.is_validation() {
            return Self::BadRequest(err.to_string());
        }
        match &err {
            EngineError::Llm(LlmError::RequestFailed { .. })
            | EngineError::Provider(ProviderError::Llm(LlmError::RequestFailed { .. })) => {
                Self::Upstream(err.to_string())
            }
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<valet_store::StoreError> for ApiError {
    fn from(err: valet_store::StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}
