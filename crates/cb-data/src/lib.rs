//! Data sources of the cell browser
//!
//! Parses the files of a dataset directory into the typed model of
//! `cb-core`, reads single genes from the expression matrix, and feeds
//! generation-tagged completions into a load coordinator.

pub mod config;
pub mod expression;
pub mod loader;
pub mod matrix;
pub mod store;
pub mod tables;

use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use config::{CoordFile, DatasetConfig, DATASET_CONFIG_FILE};
pub use loader::{load_dataset, spawn_load, DatasetSource, DirectorySource};
pub use matrix::{ExpressionMatrix, GeneList};
pub use store::JsonFileStore;

/// Errors that can occur while reading dataset files
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV parsing error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected header: expected {expected}, found {found}")]
    BadHeader { expected: String, found: String },

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("Gene not found: {0}")]
    GeneNotFound(String),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
