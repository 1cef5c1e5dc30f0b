// File: ./src/error.rs
//! Validation errors raised at the API boundary of the task engine.
//!
//! Anything touching the filesystem returns `anyhow::Result` instead; these
//! variants only describe malformed caller input so the caller can match on them.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title was empty or whitespace only
    #[error("Title must be non-null and non-blank")]
    BlankTitle,

    /// A task identifier was empty or whitespace only
    #[error("Task ID must be non-null and non-blank")]
    BlankId,

    /// A lookup that requires an existing task found nothing
    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    /// A short id prefix matched more than one task
    #[error("Task id '{prefix}' is ambiguous ({matches} matches)")]
    AmbiguousId { prefix: String, matches: usize },

    /// A named value (priority, status, sort order...) could not be parsed
    #[error("Unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

/// Rejects empty or whitespace-only identifiers.
pub fn require_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::BlankId);
    }
    Ok(())
}
