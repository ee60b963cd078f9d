//! Entry point for the `valet` server binary.
//!
//! Wires settings into the component graph — chat client, providers,
//! stores, turn engine — and serves the HTTP surface.

mod api;
mod server;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use valet_core::Settings;
use valet_engine::{TurnEngine, TurnLogger};
use valet_llm::{ChatCompletion, HttpChatClient};
use valet_providers::{
    CaldavCalendar, Calendar, CapabilityProvider, LocalTaskProvider, McpWorkspace,
    QuestionAnswerer, RetrievalAnswerer,
};
use valet_store::{Database, TodoStore, TurnStore};

use crate::state::AppState;

/// Valet — a personal assistant backend.
#[derive(Parser)]
#[command(name = "valet", version, about = "Valet — personal assistant backend")]
struct Cli {
    /// Bind address, overriding VALET_BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,

    /// Database path, overriding VALET_DB_PATH.
    #[arg(long)]
    db: Option<String>,

    /// Path to a .env file to load before reading settings.
    #[arg(long)]
    env_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("loading env file {path}"))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut settings = Settings::from_env().context("loading settings")?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }
    if let Some(db) = cli.db {
        settings.database_path = db;
    }

    run(settings).await
}

/// Build the component graph and serve.
async fn run(settings: Settings) -> Result<()> {
    let db = Database::open_and_migrate(settings.database_path.clone())
        .await
        .context("opening database")?;

    let todos = TodoStore::new(db.clone());
    let turns = TurnStore::new(db);

    let chat: Arc<dyn ChatCompletion> =
        Arc::new(HttpChatClient::new(&settings.llm).context("building chat client")?);

    let workspace: Option<Arc<dyn CapabilityProvider>> = match &settings.workspace {
        Some(ws) => {
            info!(url = %ws.url, "remote workspace provider enabled");
            Some(Arc::new(McpWorkspace::new(ws).context("building workspace client")?))
        }
        None => {
            info!("no remote workspace configured, tasks stay local");
            None
        }
    };

    let calendar: Arc<dyn Calendar> =
        Arc::new(CaldavCalendar::new(&settings.calendar).context("building calendar client")?);

    let answerer: Arc<dyn QuestionAnswerer> = Arc::new(
        RetrievalAnswerer::new(&settings.retrieval, Arc::clone(&chat))
            .context("building retrieval answerer")?,
    );

    let engine = TurnEngine::new(
        chat,
        workspace,
        LocalTaskProvider::new(todos.clone()),
        calendar,
        answerer,
        TurnLogger::new(turns),
    );

    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        todos,
        api_token: settings.api_token.clone(),
    });

    server::serve(&settings.bind_addr, state).await
}
