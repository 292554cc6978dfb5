//! Engine error type

use thiserror::Error;

/// Errors raised by the engine. None of them is fatal: the caller keeps its
/// previous state and reports the condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Cannot color on field '{field}': it has {count} different values (limit {limit})")]
    TooManyValues { field: String, count: usize, limit: usize },

    #[error("Unknown metadata field: {0}")]
    UnknownField(String),

    #[error("Unknown gene: {0}")]
    UnknownGene(String),

    #[error("Unknown legend class: {0}")]
    UnknownClass(usize),

    #[error("Could not find these IDs: {}", .0.join(", "))]
    UnknownIds(Vec<String>),

    #[error("Cannot mark more than {limit} points ({count} selected)")]
    TooManyMarked { count: usize, limit: usize },

    #[error("Required source '{source_name}' failed: {reason}")]
    RequiredSourceFailed { source_name: String, reason: String },

    #[error("No dataset is loaded")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, CoreError>;
