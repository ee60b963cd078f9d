//! Schema migration system.
//!
//! Migrations are static SQL strings keyed by version number.  The current
//! version is tracked in a `_migrations` table so migrations are idempotent
//! and only run once.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// A single migration definition.
struct Migration {
    /// Monotonically increasing version number (1, 2, 3, ...).
    version: u32,
    /// Human-readable description.
    description: &'static str,
    /// Raw SQL to execute.  May contain multiple statements.
    sql: &'static str,
}

/// All migrations in order.  Add new migrations to the end of this array.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema — todos",
        sql: r#"
            CREATE TABLE todos (
                id         TEXT PRIMARY KEY,
                text       TEXT NOT NULL,
                due_at     TEXT,
                status     TEXT NOT NULL DEFAULT 'open' CHECK(status IN ('open','done')),
                created_at INTEGER NOT NULL
            );
            CREATE INDEX idx_todos_status ON todos(status);
        "#,
    },
    Migration {
        version: 2,
        description: "turn log — append-only record per processed utterance",
        sql: r#"
            CREATE TABLE turns (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                user_message      TEXT NOT NULL,
                assistant_reply   TEXT NOT NULL,
                tools_used        TEXT,
                retrieved_doc_ids TEXT,
                created_at        INTEGER NOT NULL
            );
        "#,
    },
];

/// Run every migration newer than the recorded schema version.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| {
            row.get(0)
        })?;

    for m in MIGRATIONS.iter().filter(|m| m.version > current) {
        debug!(version = m.version, description = m.description, "applying migration");

        conn.execute_batch(m.sql)
            .map_err(|e| StoreError::Migration {
                version: m.version,
                message: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description, applied_at)
             VALUES (?1, ?2, strftime('%s','now'))",
            rusqlite::params![m.version, m.description],
        )?;

        info!(version = m.version, "migration applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_all_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.last().unwrap().version);
    }

    #[test]
    fn versions_are_strictly_increasing() {
        let mut prev = 0;
        for m in MIGRATIONS {
            assert!(m.version > prev, "migration versions must increase");
            prev = m.version;
        }
    }
}
