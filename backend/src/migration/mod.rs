//! One-shot maintenance jobs that work on stores directly, bypassing the HTTP
//! surface and the service layer.
//!
//! None of them coordinate with a running server: callers are expected to have
//! exclusive access to both databases for the duration of a run.

pub mod copy;
pub mod schema;
pub mod validate;

use thiserror::Error;

use crate::config::ConfigError;
use crate::error::AppError;

pub use copy::{CopyStats, FailedRow, copy_todos, write_todos};
pub use schema::{BootstrapOutcome, PROTECTED_TABLES, add_missing_columns, bootstrap};
pub use validate::{VALIDATION_SAMPLE_SIZE, ValidationOutcome, validate_copy};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("table '{0}' does not exist")]
    MissingTable(&'static str),

    #[error("{0} is not set")]
    MissingSetting(&'static str),

    #[error("migration cancelled")]
    Cancelled,

    #[error("migration validation failed: {0}")]
    ValidationFailed(String),
}
