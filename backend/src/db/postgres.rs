use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;

use super::repository::{TodoColumn, TodoStore, now};
use crate::models::{NewTodo, Todo, TodoChanges, TodoFilter};

const TIMESTAMP_COLUMNS: [&str; 3] = ["due_date", "created_at", "updated_at"];

const COLUMN_TYPES: &str = r#"
    SELECT column_name::text, data_type::text
    FROM information_schema.columns
    WHERE table_schema = current_schema()
      AND table_name = 'todos'
"#;

/// How the live `todos` table declares its timestamp columns.
///
/// Tables created by older releases use `SERIAL` ids and `TIMESTAMP` columns
/// holding UTC wall-clock time, so reads widen and convert and writes convert
/// back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnLayout {
    naive: Vec<&'static str>,
}

impl ColumnLayout {
    fn from_types(types: &[(String, String)]) -> Self {
        let naive = TIMESTAMP_COLUMNS
            .into_iter()
            .filter(|column| {
                types
                    .iter()
                    .any(|(name, ty)| name == *column && ty == "timestamp without time zone")
            })
            .collect();
        Self { naive }
    }

    fn is_naive(&self, column: &str) -> bool {
        self.naive.iter().any(|naive| *naive == column)
    }

    fn read(&self, column: &str) -> String {
        if self.is_naive(column) {
            format!("({column} AT TIME ZONE 'UTC') AS {column}")
        } else {
            column.to_string()
        }
    }

    fn write(&self, column: &str, param: &str) -> String {
        if self.is_naive(column) {
            format!("({param} AT TIME ZONE 'UTC')")
        } else {
            param.to_string()
        }
    }

    fn select_list(&self) -> String {
        format!(
            "id::BIGINT AS id, description, completed, priority, {}, category, {}, {}",
            self.read("due_date"),
            self.read("created_at"),
            self.read("updated_at"),
        )
    }
}

/// PostgreSQL store, used both for a self-managed server and the hosted service.
pub struct PgTodoStore {
    db: PgPool,
    layout: RwLock<Option<Arc<ColumnLayout>>>,
}

impl PgTodoStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            layout: RwLock::new(None),
        }
    }

    fn column_definition(column: TodoColumn) -> &'static str {
        match column {
            TodoColumn::Priority => "priority VARCHAR NOT NULL DEFAULT 'Medium'",
            TodoColumn::DueDate => "due_date TIMESTAMPTZ",
            TodoColumn::Category => "category VARCHAR",
        }
    }

    async fn layout(&self) -> Result<Arc<ColumnLayout>, sqlx::Error> {
        if let Some(layout) = self.layout.read().await.as_ref() {
            return Ok(Arc::clone(layout));
        }

        let types = sqlx::query_as::<_, (String, String)>(COLUMN_TYPES)
            .fetch_all(&self.db)
            .await?;
        let layout = Arc::new(ColumnLayout::from_types(&types));
        // Not cached until the table exists.
        if !types.is_empty() {
            *self.layout.write().await = Some(Arc::clone(&layout));
        }
        Ok(layout)
    }

    async fn forget_layout(&self) {
        *self.layout.write().await = None;
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, sqlx::Error> {
        let layout = self.layout().await?;
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM todos WHERE TRUE",
            layout.select_list()
        ));
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
        let layout = self.layout().await?;
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE id = $1",
            layout.select_list()
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn insert(&self, new: &NewTodo) -> Result<Todo, sqlx::Error> {
        let layout = self.layout().await?;
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos
                (description, completed, priority, due_date, category, created_at, updated_at)
            VALUES ($1, FALSE, $2, {}, $4, {}, {})
            RETURNING {}
            "#,
            layout.write("due_date", "$3"),
            layout.write("created_at", "$5"),
            layout.write("updated_at", "$5"),
            layout.select_list()
        ))
        .bind(&new.description)
        .bind(&new.priority)
        .bind(new.due_date)
        .bind(&new.category)
        .bind(now())
        .fetch_one(&self.db)
        .await
    }

    async fn apply_update(
        &self,
        id: i64,
        changes: &TodoChanges,
    ) -> Result<Option<Todo>, sqlx::Error> {
        let layout = self.layout().await?;
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET description = COALESCE($1, description),
                completed = COALESCE($2, completed),
                priority = COALESCE($3, priority),
                due_date = COALESCE({}, due_date),
                category = COALESCE($5, category),
                updated_at = {}
            WHERE id = $7
            RETURNING {}
            "#,
            layout.write("due_date", "$4"),
            layout.write("updated_at", "$6"),
            layout.select_list()
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
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok(result > 0)
    }

    async fn toggle_completed(&self, id: i64) -> Result<Option<Todo>, sqlx::Error> {
        let layout = self.layout().await?;
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET completed = NOT completed,
                updated_at = {}
            WHERE id = $2
            RETURNING {}
            "#,
            layout.write("updated_at", "$1"),
            layout.select_list()
        ))
        .bind(now())
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn list_all_by_id(&self) -> Result<Vec<Todo>, sqlx::Error> {
        let layout = self.layout().await?;
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos ORDER BY id",
            layout.select_list()
        ))
        .fetch_all(&self.db)
        .await
    }

    async fn first_by_id(&self, limit: i64) -> Result<Vec<Todo>, sqlx::Error> {
        let layout = self.layout().await?;
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos ORDER BY id LIMIT $1",
            layout.select_list()
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
        let layout = self.layout().await?;
        sqlx::query(&format!(
            r#"
            INSERT INTO todos
                (id, description, completed, priority, due_date, category, created_at, updated_at)
            VALUES ($1, $2, $3, $4, {}, $6, {}, {})
            ON CONFLICT (id) DO UPDATE SET
                description = EXCLUDED.description,
                completed = EXCLUDED.completed,
                priority = EXCLUDED.priority,
                due_date = EXCLUDED.due_date,
                category = EXCLUDED.category,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at
            "#,
            layout.write("due_date", "$5"),
            layout.write("created_at", "$7"),
            layout.write("updated_at", "$8"),
        ))
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
        sqlx::query(
            r#"
            SELECT setval(
                pg_get_serial_sequence('todos', 'id'),
                COALESCE((SELECT MAX(id) FROM todos), 0) + 1,
                false
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id BIGSERIAL PRIMARY KEY,
                description TEXT NOT NULL,
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                priority VARCHAR NOT NULL DEFAULT 'Medium',
                due_date TIMESTAMPTZ,
                category VARCHAR,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS ix_todos_created_at ON todos (created_at)")
            .execute(&self.db)
            .await?;

        self.forget_layout().await;
        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.db)
        .await
    }

    async fn todo_columns(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = 'todos'
            ORDER BY ordinal_position
            "#,
        )
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

        self.forget_layout().await;
        Ok(())
    }
}
