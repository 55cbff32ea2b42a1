mod common;

use chrono::{TimeZone, Utc};
use todo_backend::db::{TodoColumn, TodoStore, pool::connect_sqlite, SqliteTodoStore};
use todo_backend::migration::{
    self, BootstrapOutcome, MigrationError, ValidationOutcome, VALIDATION_SAMPLE_SIZE,
};
use todo_backend::models::{NewTodo, Todo};

async fn seed(store: &dyn TodoStore, n: usize) -> Vec<Todo> {
    let mut rows = Vec::new();
    for i in 0..n {
        let todo = store
            .insert(&NewTodo {
                description: format!("todo {i}"),
                priority: if i % 2 == 0 { "High" } else { "Low" }.to_string(),
                due_date: (i % 3 == 0).then(|| Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap()),
                category: (i % 2 == 1).then(|| "Work".to_string()),
            })
            .await
            .expect("insert");
        rows.push(todo);
    }
    store.toggle_completed(rows[0].id).await.expect("toggle");
    rows
}

#[tokio::test]
async fn test_copy_preserves_rows_and_validates() {
    let source = common::memory_store().await;
    let target = common::memory_store().await;
    seed(source.as_ref(), 12).await;

    let stats = migration::copy_todos(source.as_ref(), target.as_ref())
        .await
        .expect("copy");
    assert_eq!(stats.read, 12);
    assert_eq!(stats.written, 12);
    assert!(stats.failed.is_empty());

    assert_eq!(target.count().await.unwrap(), 12);
    assert_eq!(
        source.list_all_by_id().await.unwrap(),
        target.list_all_by_id().await.unwrap()
    );

    let outcome = migration::validate_copy(source.as_ref(), target.as_ref(), VALIDATION_SAMPLE_SIZE)
        .await
        .expect("validate");
    assert_eq!(
        outcome,
        ValidationOutcome::Passed {
            count: 12,
            sampled: VALIDATION_SAMPLE_SIZE
        }
    );
}

#[tokio::test]
async fn test_copy_is_an_upsert() {
    let source = common::memory_store().await;
    let target = common::memory_store().await;
    let rows = seed(source.as_ref(), 3).await;

    let mut stale = rows[1].clone();
    stale.description = "stale copy".to_string();
    target.upsert(&stale).await.unwrap();

    migration::copy_todos(source.as_ref(), target.as_ref())
        .await
        .expect("copy");
    migration::copy_todos(source.as_ref(), target.as_ref())
        .await
        .expect("second copy");

    assert_eq!(target.count().await.unwrap(), 3);
    let copied = target.get(rows[1].id).await.unwrap().unwrap();
    assert_eq!(copied.description, rows[1].description);
}

#[tokio::test]
async fn test_copy_empty_source() {
    let source = common::memory_store().await;
    let target = common::memory_store().await;

    let stats = migration::copy_todos(source.as_ref(), target.as_ref())
        .await
        .expect("copy");
    assert_eq!(stats.read, 0);
    assert_eq!(stats.written, 0);
}

#[tokio::test]
async fn test_row_failures_are_skipped() {
    let source = common::memory_store().await;
    let rows = seed(source.as_ref(), 4).await;

    // A target whose CHECK constraint rejects one row.
    let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL CHECK (description <> 'todo 2'),
            completed BOOLEAN NOT NULL DEFAULT 0,
            priority VARCHAR NOT NULL DEFAULT 'Medium',
            due_date DATETIME,
            category VARCHAR,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    let target = SqliteTodoStore::new(pool);

    let stats = migration::copy_todos(source.as_ref(), &target)
        .await
        .expect("copy");
    assert_eq!(stats.read, 4);
    assert_eq!(stats.written, 3);
    assert_eq!(stats.failed.len(), 1);
    assert_eq!(stats.failed[0].id, rows[2].id);

    // rows before and after the failure are committed
    assert!(target.get(rows[1].id).await.unwrap().is_some());
    assert!(target.get(rows[3].id).await.unwrap().is_some());

    let outcome = migration::validate_copy(source.as_ref(), &target, VALIDATION_SAMPLE_SIZE)
        .await
        .expect("validate");
    assert_eq!(outcome, ValidationOutcome::CountMismatch { source: 4, target: 3 });
    assert!(!outcome.passed());
}

#[tokio::test]
async fn test_validation_detects_field_drift() {
    let source = common::memory_store().await;
    let target = common::memory_store().await;
    let rows = seed(source.as_ref(), 3).await;
    migration::copy_todos(source.as_ref(), target.as_ref())
        .await
        .expect("copy");

    let mut drifted = target.get(rows[0].id).await.unwrap().unwrap();
    drifted.priority = "Medium".to_string();
    target.upsert(&drifted).await.unwrap();

    let outcome = migration::validate_copy(source.as_ref(), target.as_ref(), VALIDATION_SAMPLE_SIZE)
        .await
        .expect("validate");
    assert_eq!(
        outcome,
        ValidationOutcome::FieldMismatch {
            id: rows[0].id,
            field: "priority"
        }
    );
}

#[tokio::test]
async fn test_bootstrap_creates_once() {
    let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
    let store = SqliteTodoStore::new(pool);

    assert_eq!(
        migration::bootstrap(&store, false).await.unwrap(),
        BootstrapOutcome::Created
    );
    assert_eq!(
        migration::bootstrap(&store, false).await.unwrap(),
        BootstrapOutcome::AlreadyPresent
    );
}

#[tokio::test]
async fn test_protected_bootstrap_leaves_other_tables_alone() {
    let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
    sqlx::query("CREATE TABLE patients (id INTEGER PRIMARY KEY, name TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO patients (name) VALUES ('kept')")
        .execute(&pool)
        .await
        .unwrap();
    let store = SqliteTodoStore::new(pool.clone());

    assert_eq!(
        migration::bootstrap(&store, true).await.unwrap(),
        BootstrapOutcome::Created
    );
    assert_eq!(
        migration::bootstrap(&store, true).await.unwrap(),
        BootstrapOutcome::AlreadyPresent
    );

    assert_eq!(store.table_names().await.unwrap(), vec!["patients", "todos"]);
    let kept: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(kept, 1);
}

#[tokio::test]
async fn test_add_missing_columns_on_legacy_table() {
    let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT 0,
            category VARCHAR,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO todos (description) VALUES ('legacy row')")
        .execute(&pool)
        .await
        .unwrap();
    let store = SqliteTodoStore::new(pool);

    let added = migration::add_missing_columns(&store).await.expect("migrate");
    assert_eq!(added, vec![TodoColumn::Priority, TodoColumn::DueDate]);

    let again = migration::add_missing_columns(&store).await.expect("migrate");
    assert!(again.is_empty());

    let columns = store.todo_columns().await.unwrap();
    for name in ["priority", "due_date", "category"] {
        assert!(columns.iter().any(|c| c == name), "missing {name}");
    }

    let legacy = store.list_all_by_id().await.unwrap();
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].priority, "Medium");
    assert!(legacy[0].due_date.is_none());
}

#[tokio::test]
async fn test_add_missing_columns_without_table() {
    let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
    let store = SqliteTodoStore::new(pool);

    let err = migration::add_missing_columns(&store).await.unwrap_err();
    assert!(matches!(err, MigrationError::MissingTable("todos")));
}
