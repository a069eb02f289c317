//! FILENAME: cube-engine/src/error.rs

use facts::Dimension;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CubeError {
    /// A drill-through cell did not name a value for every dimension.
    #[error("Incomplete cell specification: missing {}", join_dimensions(.missing))]
    IncompleteCell { missing: Vec<Dimension> },

    #[error("Invalid value {raw:?} for dimension {dimension}")]
    InvalidValue { dimension: Dimension, raw: String },

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Invalid cube definition: {0}")]
    InvalidDefinition(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CubeError>;

fn join_dimensions(dimensions: &[Dimension]) -> String {
    dimensions
        .iter()
        .map(|d| d.name())
        .collect::<Vec<_>>()
        .join(", ")
}
