//! Todo persistence.
//!
//! SQLite-backed CRUD for the local task list — the built-in fallback
//! provider for the task-creation intent.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Storage format for the optional due timestamp.
const DUE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A persisted todo item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier (UUID v7).
    pub id: String,
    /// What the todo is about.
    pub text: String,
    /// Optional deadline.
    pub due: Option<NaiveDateTime>,
    /// Lifecycle status: `open` or `done`.
    pub status: String,
    /// Unix timestamp when the todo was created.
    pub created_at: i64,
}

/// CRUD operations on todos.
#[derive(Clone)]
pub struct TodoStore {
    db: Database,
}

impl TodoStore {
    /// Create a todo store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new todo in `open` status and return the stored record.
    pub async fn create(&self, text: &str, due: Option<NaiveDateTime>) -> StoreResult<Todo> {
        let id = Uuid::now_v7().to_string();
        let text = text.to_string();
        let now = Utc::now().timestamp();

        let todo = Todo {
            id: id.clone(),
            text: text.clone(),
            due,
            status: "open".to_string(),
            created_at: now,
        };

        let due_str = due.map(|d| d.format(DUE_FORMAT).to_string());
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO todos (id, text, due_at, status, created_at)
                     VALUES (?1, ?2, ?3, 'open', ?4)",
                    rusqlite::params![id, text, due_str, now],
                )?;
                Ok(())
            })
            .await?;

        debug!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// List todos, optionally filtered by status, newest first.
    pub async fn list(&self, status: Option<&str>) -> StoreResult<Vec<Todo>> {
        let status = status.map(str::to_string);
        self.db
            .execute(move |conn| {
                let (sql, params): (&str, Vec<String>) = match &status {
                    Some(s) => (
                        "SELECT id, text, due_at, status, created_at FROM todos
                         WHERE status = ?1 ORDER BY created_at DESC",
                        vec![s.clone()],
                    ),
                    None => (
                        "SELECT id, text, due_at, status, created_at FROM todos
                         ORDER BY created_at DESC",
                        Vec::new(),
                    ),
                };

                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_todo)?;
                let mut todos = Vec::new();
                for row in rows {
                    todos.push(row?);
                }
                Ok(todos)
            })
            .await
    }

    /// Mark a todo as done.
    pub async fn complete(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE todos SET status = 'done' WHERE id = ?1",
                    rusqlite::params![id],
                )?;
                if changed == 0 {
                    return Err(StoreError::NotFound {
                        entity: "todo",
                        id,
                    });
                }
                Ok(())
            })
            .await
    }
}

/// Map a result row to a [`Todo`].
fn row_to_todo(row: &rusqlite::Row<'_>) -> rusqlite::Result<Todo> {
    let due_str: Option<String> = row.get(2)?;
    let due = due_str.and_then(|s| NaiveDateTime::parse_from_str(&s, DUE_FORMAT).ok());
    Ok(Todo {
        id: row.get(0)?,
        text: row.get(1)?,
        due,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}
