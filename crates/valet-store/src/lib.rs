//! # valet-store
//!
//! SQLite persistence for Valet.
//!
//! Provides the [`Database`] handle (WAL mode, async access via the
//! blocking pool), versioned migrations, the [`TodoStore`] backing the
//! local task provider, and the append-only [`TurnStore`] that records
//! every processed turn.

pub mod db;
pub mod error;
pub mod migration;
pub mod todo_store;
pub mod turn_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use todo_store::{Todo, TodoStore};
pub use turn_store::{TurnRecord, TurnStore};
