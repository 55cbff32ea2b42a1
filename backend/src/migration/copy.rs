use serde::Serialize;
use tracing::{error, info};

use super::MigrationError;
use crate::db::TodoStore;
use crate::models::Todo;

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Default, Serialize)]
pub struct CopyStats {
    pub read: usize,
    pub written: usize,
    pub failed: Vec<FailedRow>,
}

#[derive(Debug, Serialize)]
pub struct FailedRow {
    pub id: i64,
    pub error: String,
}

/// Reads every source row in id order and upserts it into `target`.
pub async fn copy_todos(
    source: &dyn TodoStore,
    target: &dyn TodoStore,
) -> Result<CopyStats, MigrationError> {
    info!("Reading todos from {} source", source.backend_name());
    let todos = source.list_all_by_id().await?;
    info!("Found {} todos in source database", todos.len());

    if todos.is_empty() {
        return Ok(CopyStats::default());
    }

    write_todos(&todos, target).await
}

/// Each row is committed on its own, so a rejected row never discards the
/// rows written before it. Row-level database errors are logged and skipped;
/// connection-level errors abort the run.
pub async fn write_todos(
    todos: &[Todo],
    target: &dyn TodoStore,
) -> Result<CopyStats, MigrationError> {
    let mut stats = CopyStats {
        read: todos.len(),
        ..Default::default()
    };

    for (i, todo) in todos.iter().enumerate() {
        match target.upsert(todo).await {
            Ok(()) => stats.written += 1,
            Err(e) if is_row_error(&e) => {
                error!("Failed to migrate todo {}: {}", todo.id, e);
                stats.failed.push(FailedRow {
                    id: todo.id,
                    error: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("Migrated {}/{} todos...", i + 1, todos.len());
        }
    }

    if stats.written > 0 {
        target.sync_id_sequence().await?;
    }

    info!(
        "Wrote {} todos to {} target ({} failed)",
        stats.written,
        target.backend_name(),
        stats.failed.len()
    );
    Ok(stats)
}

fn is_row_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(_) | sqlx::Error::Encode(_) | sqlx::Error::TypeNotFound { .. }
    )
}
