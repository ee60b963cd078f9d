//! Shared application state for the HTTP surface.

use std::sync::Arc;

use valet_engine::TurnEngine;
use valet_store::TodoStore;

/// State accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The turn engine processing chat requests.
    pub engine: Arc<TurnEngine>,

    /// Direct todo access for the listing endpoint.
    pub todos: TodoStore,

    /// Optional shared token required on chat requests.
    pub api_token: Option<String>,
}
