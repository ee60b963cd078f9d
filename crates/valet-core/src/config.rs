//! Environment-backed configuration.
//!
//! [`Settings`] is loaded once at startup and passed immutably into each
//! component at construction.  Components never reach into process-wide
//! state after that point.

use crate::error::{CoreError, CoreResult};

/// Chat-completion collaborator settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible endpoint (e.g. a local Ollama).
    pub base_url: String,
    /// Model identifier to request.
    pub model: String,
}

/// Retrieval (vector-search) collaborator settings.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    /// Base URL of the retrieval service.
    pub base_url: String,
    /// Collection to search.
    pub collection: String,
    /// Number of snippets to retrieve per question.
    pub top_k: usize,
}

/// CalDAV calendar settings.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Calendar collection URL (events are PUT beneath it).
    pub url: String,
    /// Basic-auth username, if the server requires one.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
}

/// Remote document-workspace provider settings.
///
/// Absence of these settings disables the remote provider entirely; the
/// local task store then handles every task directly.
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    /// MCP-style JSON-RPC endpoint URL.
    pub url: String,
    /// Bearer token for the workspace API.
    pub token: String,
    /// Parent database/container the created pages land in.
    pub database_id: String,
}

/// Top-level application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Chat-completion collaborator.
    pub llm: LlmSettings,
    /// Retrieval collaborator.
    pub retrieval: RetrievalSettings,
    /// Calendar provider.
    pub calendar: CalendarSettings,
    /// Remote workspace provider, when configured.
    pub workspace: Option<WorkspaceSettings>,
    /// SQLite database path.
    pub database_path: String,
    /// HTTP bind address (`host:port`).
    pub bind_addr: String,
    /// Optional shared token required on chat requests.
    pub api_token: Option<String>,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Call [`dotenvy::dotenv`] first if a `.env` file should be honored.
    /// Every value has a local-development default except the workspace
    /// provider, which stays disabled unless fully configured.
    pub fn from_env() -> CoreResult<Self> {
        let workspace = match (
            env_opt("VALET_WORKSPACE_URL"),
            env_opt("VALET_WORKSPACE_TOKEN"),
            env_opt("VALET_WORKSPACE_DATABASE_ID"),
        ) {
            (Some(url), Some(token), Some(database_id)) => Some(WorkspaceSettings {
                url,
                token,
                database_id,
            }),
            (None, None, None) => None,
            _ => {
                return Err(CoreError::Config {
                    reason: "VALET_WORKSPACE_URL, VALET_WORKSPACE_TOKEN and \
                             VALET_WORKSPACE_DATABASE_ID must be set together"
                        .into(),
                });
            }
        };

        Ok(Self {
            llm: LlmSettings {
                base_url: env_or("VALET_LLM_BASE_URL", "http://localhost:11434"),
                model: env_or("VALET_LLM_MODEL", "llama3"),
            },
            retrieval: RetrievalSettings {
                base_url: env_or("VALET_RETRIEVAL_URL", "http://localhost:6333"),
                collection: env_or("VALET_RETRIEVAL_COLLECTION", "notes"),
                top_k: env_or("VALET_RETRIEVAL_TOP_K", "5").parse().map_err(|_| {
                    CoreError::Config {
                        reason: "VALET_RETRIEVAL_TOP_K must be a positive integer".into(),
                    }
                })?,
            },
            calendar: CalendarSettings {
                url: env_or("VALET_CALDAV_URL", "http://localhost:5232/valet/calendar"),
                username: env_opt("VALET_CALDAV_USERNAME"),
                password: env_opt("VALET_CALDAV_PASSWORD"),
            },
            workspace,
            database_path: env_or("VALET_DB_PATH", "valet.db"),
            bind_addr: env_or("VALET_BIND_ADDR", "127.0.0.1:8080"),
            api_token: env_opt("VALET_API_TOKEN"),
        })
    }
}

/// Read an environment variable, falling back to a default.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating empty values as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
