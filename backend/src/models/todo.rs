use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub description: String,
    pub completed: bool,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields the store writes on insert. `id` and timestamps are assigned at write time.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub description: String,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.category.is_none()
    }
}

/// Equality filters for listing; absent fields are unconstrained.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTodoRequest {
    pub description: String,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl NewTodoRequest {
    /// Shape check on the raw payload, before any trimming.
    pub fn check_shape(&self) -> Result<(), String> {
        check_description_shape(&self.description)
    }
}

impl UpdateTodoRequest {
    pub fn check_shape(&self) -> Result<(), String> {
        match &self.description {
            Some(description) => check_description_shape(description),
            None => Ok(()),
        }
    }
}

impl From<UpdateTodoRequest> for TodoChanges {
    fn from(req: UpdateTodoRequest) -> Self {
        Self {
            description: req.description,
            completed: req.completed,
            priority: req.priority,
            due_date: req.due_date,
            category: req.category,
        }
    }
}

fn check_description_shape(description: &str) -> Result<(), String> {
    let len = description.chars().count();
    if len == 0 {
        return Err("description: must contain at least 1 character".to_string());
    }
    if len > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "description: must contain at most {} characters",
            MAX_DESCRIPTION_LEN
        ));
    }
    Ok(())
}
