//! The append-only turn log.
//!
//! One record per processed utterance, written after the dispatch result
//! exists.  Records are never mutated or deleted by the core; lifecycle
//! beyond insertion belongs to whoever owns the database file.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::error::StoreResult;

/// A persisted turn record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Auto-incrementing row id.
    pub id: i64,
    /// The raw incoming utterance.
    pub user_message: String,
    /// The final reply delivered to the user.
    pub assistant_reply: String,
    /// Comma-joined tool names, `None` when no tool fired.
    pub tools_used: Option<String>,
    /// Comma-joined retrieved document ids, `None` when none were used.
    pub retrieved_doc_ids: Option<String>,
    /// Unix timestamp when the record was written.
    pub created_at: i64,
}

/// Append-only persistence sink for turn records.
#[derive(Clone)]
pub struct TurnStore {
    db: Database,
}

impl TurnStore {
    /// Create a turn store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one turn record.
    ///
    /// Empty tool/id lists are stored as NULL, matching the comma-joined
    /// or-empty contract of the sink.
    pub async fn record(
        &self,
        user_message: &str,
        assistant_reply: &str,
        tools_used: &[String],
        retrieved_ids: &[String],
    ) -> StoreResult<()> {
        let user_message = user_message.to_string();
        let assistant_reply = assistant_reply.to_string();
        let tools = join_nonempty(tools_used);
        let ids = join_nonempty(retrieved_ids);

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO turns (user_message, assistant_reply, tools_used, retrieved_doc_ids, created_at)
                     VALUES (?1, ?2, ?3, ?4, strftime('%s','now'))",
                    rusqlite::params![user_message, assistant_reply, tools, ids],
                )?;
                Ok(())
            })
            .await?;

        debug!("turn recorded");
        Ok(())
    }

    /// Fetch the most recent turn records, newest first.
    pub async fn recent(&self, limit: i64) -> StoreResult<Vec<TurnRecord>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_message, assistant_reply, tools_used, retrieved_doc_ids, created_at
                     FROM turns ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map([limit], |row| {
                    Ok(TurnRecord {
                        id: row.get(0)?,
                        user_message: row.get(1)?,
                        assistant_reply: row.get(2)?,
                        tools_used: row.get(3)?,
                        retrieved_doc_ids: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await
    }
}

/// Comma-join a list, `None` when it is empty.
fn join_nonempty(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> TurnStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        TurnStore::new(db)
    }

    #[tokio::test]
    async fn record_joins_lists_with_commas() {
        let store = store().await;
        store
            .record(
                "what did I write about rust?",
                "You wrote two notes.",
                &[],
                &["notes/rust.md".into(), "notes/wasm.md".into()],
            )
            .await
            .unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].tools_used, None);
        assert_eq!(
            recent[0].retrieved_doc_ids.as_deref(),
            Some("notes/rust.md,notes/wasm.md")
        );
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let store = store().await;
        store.record("first", "a", &["create_todo".into()], &[]).await.unwrap();
        store.record("second", "b", &[], &[]).await.unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent[0].user_message, "second");
        assert_eq!(recent[1].user_message, "first");
        assert_eq!(recent[1].tools_used.as_deref(), Some("create_todo"));
    }
}
