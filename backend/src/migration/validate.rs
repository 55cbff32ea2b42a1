use serde::Serialize;
use tracing::{info, warn};

use super::MigrationError;
use crate::db::TodoStore;
use crate::models::Todo;

pub const VALIDATION_SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationOutcome {
    Passed { count: i64, sampled: usize },
    CountMismatch { source: i64, target: i64 },
    MissingRow { id: i64 },
    FieldMismatch { id: i64, field: &'static str },
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, ValidationOutcome::Passed { .. })
    }
}

/// Compares row counts, then spot-checks the first `sample_size` source rows.
pub async fn validate_copy(
    source: &dyn TodoStore,
    target: &dyn TodoStore,
    sample_size: usize,
) -> Result<ValidationOutcome, MigrationError> {
    let source_count = source.count().await?;
    let target_count = target.count().await?;
    info!("Source: {} todos, target: {} todos", source_count, target_count);

    if source_count != target_count {
        warn!("Record counts don't match");
        return Ok(ValidationOutcome::CountMismatch {
            source: source_count,
            target: target_count,
        });
    }

    let limit = i64::try_from(sample_size).unwrap_or(i64::MAX);
    let sample: Vec<Todo> = source.first_by_id(limit).await?;

    for expected in &sample {
        let Some(actual) = target.get(expected.id).await? else {
            warn!("Todo {} not found in target", expected.id);
            return Ok(ValidationOutcome::MissingRow { id: expected.id });
        };
        if let Some(field) = first_mismatch(expected, &actual) {
            warn!("Todo {} differs in field '{}'", expected.id, field);
            return Ok(ValidationOutcome::FieldMismatch {
                id: expected.id,
                field,
            });
        }
    }

    info!(
        "Validation passed: {} rows, {} sampled",
        source_count,
        sample.len()
    );
    Ok(ValidationOutcome::Passed {
        count: source_count,
        sampled: sample.len(),
    })
}

// Timestamps are left out: engines may round them differently.
fn first_mismatch(expected: &Todo, actual: &Todo) -> Option<&'static str> {
    if expected.description != actual.description {
        Some("description")
    } else if expected.completed != actual.completed {
        Some("completed")
    } else if expected.priority != actual.priority {
        Some("priority")
    } else if expected.due_date != actual.due_date {
        Some("due_date")
    } else if expected.category != actual.category {
        Some("category")
    } else {
        None
    }
}
