//! Built-in local task provider.
//!
//! The always-available fallback for the task-creation intent: writes
//! straight to the SQLite todo store, no network, no discovery.

use tracing::debug;

use valet_core::TaskSlots;
use valet_store::{Todo, TodoStore};

use crate::error::ProviderResult;

/// Tool name reported in audit metadata when a task lands locally.
pub const LOCAL_TASK_TOOL: &str = "create_todo";

/// Local, store-backed task provider.
#[derive(Clone)]
pub struct LocalTaskProvider {
    todos: TodoStore,
}

impl LocalTaskProvider {
    /// Create a provider over the given todo store.
    pub fn new(todos: TodoStore) -> Self {
        Self { todos }
    }

    /// Create a todo from task slots.
    pub async fn create(&self, slots: &TaskSlots) -> ProviderResult<Todo> {
        let todo = self.todos.create(&slots.text, slots.due).await?;
        debug!(todo_id = %todo.id, "task stored locally");
        Ok(todo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valet_store::Database;

    #[tokio::test]
    async fn creates_todo_from_slots() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        let provider = LocalTaskProvider::new(TodoStore::new(db));

        let todo = provider
            .create(&TaskSlots::new("Buy milk", None))
            .await
            .unwrap();
        assert_eq!(todo.text, "Buy milk");
        assert_eq!(todo.status, "open");
    }
}
