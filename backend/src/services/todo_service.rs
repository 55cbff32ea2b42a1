use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::db::TodoStore;
use crate::error::AppError;
use crate::models::{
    DEFAULT_PRIORITY, MAX_DESCRIPTION_LEN, NewTodo, NewTodoRequest, Todo, TodoChanges, TodoFilter,
    UpdateTodoRequest,
};

/// Business-rule failures the store itself does not enforce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Description cannot be empty or whitespace-only")]
    EmptyDescription,

    #[error("Description cannot exceed {max} characters")]
    DescriptionTooLong { max: usize },
}

/// Trims and checks a description, returning the value to store.
pub fn normalize_description(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Stateless orchestration over a store; build one per request.
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, AppError> {
        Ok(self.store.list(filter).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Todo>, AppError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn create(&self, req: NewTodoRequest) -> Result<Todo, AppError> {
        let new = NewTodo {
            description: normalize_description(&req.description)?,
            priority: req.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            due_date: req.due_date,
            category: req.category,
        };

        let todo = self.store.insert(&new).await?;
        debug!("created todo {}", todo.id);
        Ok(todo)
    }

    /// A missing id wins over an invalid payload. An empty change set is
    /// not written, so `updated_at` stays as stored.
    pub async fn update(&self, id: i64, req: UpdateTodoRequest) -> Result<Option<Todo>, AppError> {
        let Some(existing) = self.store.get(id).await? else {
            return Ok(None);
        };

        let mut changes = TodoChanges::from(req);
        if changes.is_empty() {
            debug!("empty update for todo {}", id);
            return Ok(Some(existing));
        }
        if let Some(description) = changes.description.take() {
            changes.description = Some(normalize_description(&description)?);
        }

        Ok(self.store.apply_update(id, &changes).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.store.remove(id).await?)
    }

    pub async fn toggle_complete(&self, id: i64) -> Result<Option<Todo>, AppError> {
        Ok(self.store.toggle_completed(id).await?)
    }
}
