use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::repository::{TODO_COLUMNS, TodoColumn, TodoStore, now};
use crate::models::{NewTodo, Todo, TodoChanges, TodoFilter};

pub struct SqliteTodoStore {
    db: SqlitePool,
}

impl SqliteTodoStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    fn column_definition(column: TodoColumn) -> &'static str {
        match column {
            TodoColumn::Priority => "priority VARCHAR NOT NULL DEFAULT 'Medium'",
            TodoColumn::DueDate => "due_date DATETIME",
            TodoColumn::Category => "category VARCHAR",
        }
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, sqlx::Error> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE 1 = 1"));
        if let Some(completed) = filter.completed {
            query.push(" AND completed = ").push_bind(completed);
        }
        if let Some(priority) = &filter.priority {
            query.push(" AND priority = ").push_bind(priority.clone());
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        query.build_query_as::<Todo>().fetch_all(&self.db).await
    }

    async fn get(&self, id: i64) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    async fn insert(&self, new: &NewTodo) -> Result<Todo, sqlx::Error> {
        let now = now();
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos
                (description, completed, priority, due_date, category, created_at, updated_at)
            VALUES (?1, 0, ?2, ?3, ?4, ?5, ?5)
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(&new.description)
        .bind(&new.priority)
        .bind(new.due_date)
        .bind(&new.category)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn apply_update(
        &self,
        id: i64,
        changes: &TodoChanges,
    ) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET description = COALESCE(?1, description),
                completed = COALESCE(?2, completed),
                priority = COALESCE(?3, priority),
                due_date = COALESCE(?4, due_date),
                category = COALESCE(?5, category),
                updated_at = ?6
            WHERE id = ?7
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(&changes.description)
        .bind(changes.completed)
        .bind(&changes.priority)
        .bind(changes.due_date)
        .bind(&changes.category)
        .bind(now())
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn remove(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok(result > 0)
    }

    async fn toggle_completed(&self, id: i64) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET completed = NOT completed,
                updated_at = ?1
            WHERE id = ?2
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(now())
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn list_all_by_id(&self) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY id"))
            .fetch_all(&self.db)
            .await
    }

    async fn first_by_id(&self, limit: i64) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.db)
            .await
    }

    async fn upsert(&self, todo: &Todo) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO todos
                (id, description, completed, priority, due_date, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                description = excluded.description,
                completed = excluded.completed,
                priority = excluded.priority,
                due_date = excluded.due_date,
                category = excluded.category,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(todo.id)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(&todo.priority)
        .bind(todo.due_date)
        .bind(&todo.category)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn sync_id_sequence(&self) -> Result<(), sqlx::Error> {
        // AUTOINCREMENT already tracks the largest explicit rowid.
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                completed BOOLEAN NOT NULL DEFAULT 0,
                priority VARCHAR NOT NULL DEFAULT 'Medium',
                due_date DATETIME,
                category VARCHAR,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS ix_todos_created_at ON todos (created_at)")
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.db)
        .await
    }

    async fn todo_columns(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info('todos') ORDER BY cid")
            .fetch_all(&self.db)
            .await
    }

    async fn add_todo_column(&self, column: TodoColumn) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "ALTER TABLE todos ADD COLUMN {}",
            Self::column_definition(column)
        ))
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
