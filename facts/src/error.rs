//! FILENAME: facts/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Returned when a string does not name any known dimension.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown dimension: {0}")]
pub struct ParseDimensionError(pub String);
