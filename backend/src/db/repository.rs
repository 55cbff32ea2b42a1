use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};

use crate::models::{NewTodo, Todo, TodoChanges, TodoFilter};

pub(crate) const TODO_COLUMNS: &str =
    "id, description, completed, priority, due_date, category, created_at, updated_at";

pub const TODOS_TABLE: &str = "todos";

/// Columns added to `todos` after its first release, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoColumn {
    Priority,
    DueDate,
    Category,
}

impl TodoColumn {
    pub const ALL: [TodoColumn; 3] = [TodoColumn::Priority, TodoColumn::DueDate, TodoColumn::Category];

    pub fn name(self) -> &'static str {
        match self {
            TodoColumn::Priority => "priority",
            TodoColumn::DueDate => "due_date",
            TodoColumn::Category => "category",
        }
    }
}

/// All direct database access for Todo records.
///
/// Errors are returned as-is; implementations never retry.
#[async_trait]
pub trait TodoStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), sqlx::Error>;

    /// Newest first; every present filter field narrows by equality.
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, sqlx::Error>;

    async fn get(&self, id: i64) -> Result<Option<Todo>, sqlx::Error>;

    async fn insert(&self, new: &NewTodo) -> Result<Todo, sqlx::Error>;

    /// Overwrites only the fields present in `changes` and refreshes `updated_at`.
    async fn apply_update(&self, id: i64, changes: &TodoChanges)
    -> Result<Option<Todo>, sqlx::Error>;

    async fn remove(&self, id: i64) -> Result<bool, sqlx::Error>;

    async fn toggle_completed(&self, id: i64) -> Result<Option<Todo>, sqlx::Error>;

    /// Every row in primary-key order.
    async fn list_all_by_id(&self) -> Result<Vec<Todo>, sqlx::Error>;

    /// The `limit` lowest ids, in primary-key order.
    async fn first_by_id(&self, limit: i64) -> Result<Vec<Todo>, sqlx::Error>;

    async fn count(&self) -> Result<i64, sqlx::Error>;

    /// Insert-or-replace by primary key, keeping every field of `todo` verbatim.
    async fn upsert(&self, todo: &Todo) -> Result<(), sqlx::Error>;

    /// Moves the id generator past `MAX(id)` after explicit-id inserts.
    async fn sync_id_sequence(&self) -> Result<(), sqlx::Error>;

    async fn ensure_schema(&self) -> Result<(), sqlx::Error>;

    async fn table_names(&self) -> Result<Vec<String>, sqlx::Error>;

    async fn todo_columns(&self) -> Result<Vec<String>, sqlx::Error>;

    async fn add_todo_column(&self, column: TodoColumn) -> Result<(), sqlx::Error>;
}

/// Write-time timestamp, truncated to what both engines store losslessly.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
