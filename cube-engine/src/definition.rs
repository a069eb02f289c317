//! FILENAME: cube-engine/src/definition.rs
//! Cube Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a cube view: which
//! dimensions go on rows, which on columns, and how the measure is
//! aggregated. Definitions are immutable snapshots; every query builds its
//! aggregates from scratch using one.

use serde::{Deserialize, Serialize};
use facts::Dimension;

use crate::error::{CubeError, Result};

/// Label used for margin (subtotal / grand total) headers.
pub const DEFAULT_MARGINS_NAME: &str = "Total";

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for the sales measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    Average,
    Min,
    Max,
}

// ============================================================================
// CUBE DEFINITION
// ============================================================================

/// Describes one cube view: grouping dimensions split across two axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeDefinition {
    /// Dimensions nested on the row axis, outermost first.
    pub row_dimensions: Vec<Dimension>,

    /// Dimensions nested on the column axis, outermost first.
    pub column_dimensions: Vec<Dimension>,

    #[serde(default)]
    pub aggregation: AggregationType,

    /// Whether intermediate levels of a nested axis get subtotal items.
    /// The grand total is always present.
    #[serde(default = "default_show_subtotals")]
    pub show_subtotals: bool,

    #[serde(default = "default_margins_name")]
    pub margins_name: String,
}

fn default_show_subtotals() -> bool {
    true
}

fn default_margins_name() -> String {
    DEFAULT_MARGINS_NAME.to_string()
}

impl CubeDefinition {
    pub fn new(row_dimensions: Vec<Dimension>, column_dimensions: Vec<Dimension>) -> Self {
        CubeDefinition {
            row_dimensions,
            column_dimensions,
            aggregation: AggregationType::Sum,
            show_subtotals: true,
            margins_name: default_margins_name(),
        }
    }

    /// The full cube: Year, Quarter, Product on rows; Region, Channel on columns.
    pub fn full_cube() -> Self {
        CubeDefinition::new(
            vec![Dimension::Year, Dimension::Quarter, Dimension::Product],
            vec![Dimension::Region, Dimension::Channel],
        )
    }

    /// A face of the cube: exactly one dimension per axis.
    pub fn face(row: Dimension, column: Dimension) -> Self {
        CubeDefinition::new(vec![row], vec![column])
    }

    /// Year × Region.
    pub fn face_default() -> Self {
        CubeDefinition::face(Dimension::Year, Dimension::Region)
    }

    /// Layout for a diced section: Product, Channel on rows; Year, Region on columns.
    pub fn section() -> Self {
        CubeDefinition::new(
            vec![Dimension::Product, Dimension::Channel],
            vec![Dimension::Year, Dimension::Region],
        )
    }

    pub fn with_aggregation(mut self, aggregation: AggregationType) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_margins_name(mut self, name: impl Into<String>) -> Self {
        self.margins_name = name.into();
        self
    }

    pub fn without_subtotals(mut self) -> Self {
        self.show_subtotals = false;
        self
    }

    /// All grouping dimensions: rows then columns. This is the key order
    /// used by the aggregate cache.
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.row_dimensions
            .iter()
            .chain(self.column_dimensions.iter())
            .copied()
            .collect()
    }

    /// Rejects empty definitions and dimensions used more than once.
    pub fn validate(&self) -> Result<()> {
        let dims = self.dimensions();
        if dims.is_empty() {
            return Err(CubeError::InvalidDefinition(
                "at least one grouping dimension is required".to_string(),
            ));
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(CubeError::InvalidDefinition(format!(
                    "dimension {} is used more than once",
                    dim
                )));
            }
        }
        Ok(())
    }
}
