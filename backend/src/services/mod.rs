pub mod todo_service;

pub use todo_service::{TodoService, ValidationError, normalize_description};
