use tracing::info;

use super::MigrationError;
use crate::db::{TODOS_TABLE, TodoColumn, TodoStore};

/// Tables that live next to `todos` on the hosted database and must never be touched.
pub const PROTECTED_TABLES: [&str; 3] = ["patients", "migration_checkpoints", "alembic_version"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    AlreadyPresent,
}

/// Creates the schema if absent.
///
/// With `protected` set (the hosted target) nothing at all is issued when
/// `todos` already exists, and the protected tables found are reported.
pub async fn bootstrap(
    store: &dyn TodoStore,
    protected: bool,
) -> Result<BootstrapOutcome, MigrationError> {
    let existing = store.table_names().await?;
    let has_todos = existing.iter().any(|t| t == TODOS_TABLE);

    if protected {
        let found: Vec<&str> = PROTECTED_TABLES
            .iter()
            .copied()
            .filter(|name| existing.iter().any(|t| t == name))
            .collect();
        if !found.is_empty() {
            info!("Found existing tables {:?}; these will NOT be modified", found);
        }
        if has_todos {
            info!("Table 'todos' already exists, skipping creation");
            return Ok(BootstrapOutcome::AlreadyPresent);
        }
    }

    store.ensure_schema().await?;

    if has_todos {
        Ok(BootstrapOutcome::AlreadyPresent)
    } else {
        info!("Table 'todos' created in {} database", store.backend_name());
        Ok(BootstrapOutcome::Created)
    }
}

/// Adds whichever later columns `todos` lacks. Existing columns are never altered.
pub async fn add_missing_columns(store: &dyn TodoStore) -> Result<Vec<TodoColumn>, MigrationError> {
    let existing = store.todo_columns().await?;
    if existing.is_empty() {
        return Err(MigrationError::MissingTable(TODOS_TABLE));
    }
    info!("Existing columns: {:?}", existing);

    let mut added = Vec::new();
    for column in TodoColumn::ALL {
        if existing.iter().any(|c| c == column.name()) {
            info!("Column '{}' already exists", column.name());
            continue;
        }
        info!("Adding column '{}'...", column.name());
        store.add_todo_column(column).await?;
        added.push(column);
    }

    Ok(added)
}
