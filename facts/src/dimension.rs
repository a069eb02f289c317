//! FILENAME: facts/src/dimension.rs
//! Dimensions - the categorical and ordinal attributes a sale is grouped by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseDimensionError;

// ============================================================================
// DIMENSION
// ============================================================================

/// A grouping attribute of a fact record.
///
/// The declaration order is the canonical order used when a cube groups by
/// "every dimension".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Year,
    Quarter,
    Product,
    Region,
    Channel,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Year,
        Dimension::Quarter,
        Dimension::Product,
        Dimension::Region,
        Dimension::Channel,
    ];

    /// English display name.
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Year => "Year",
            Dimension::Quarter => "Quarter",
            Dimension::Product => "Product",
            Dimension::Region => "Region",
            Dimension::Channel => "Channel",
        }
    }

    /// Column label used by the source dataset.
    pub fn source_label(self) -> &'static str {
        match self {
            Dimension::Year => "Año",
            Dimension::Quarter => "Trimestre",
            Dimension::Product => "Producto",
            Dimension::Region => "Región",
            Dimension::Channel => "Canal",
        }
    }

    /// Whether values of this dimension are integers (ordered numerically).
    pub fn is_numeric(self) -> bool {
        matches!(self, Dimension::Year | Dimension::Quarter)
    }

    /// Parses a raw string into a value of this dimension.
    /// Returns None when a numeric dimension receives a non-integer.
    pub fn parse_value(self, raw: &str) -> Option<DimensionValue> {
        let raw = raw.trim();
        if self.is_numeric() {
            raw.parse::<i32>().ok().map(DimensionValue::Number)
        } else {
            Some(DimensionValue::Text(raw.to_string()))
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = ParseDimensionError;

    /// Accepts English names and the dataset's Spanish labels, singular or
    /// plural, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "year" | "years" | "año" | "años" | "anio" | "anios" => Ok(Dimension::Year),
            "quarter" | "quarters" | "trimestre" | "trimestres" | "trim" => Ok(Dimension::Quarter),
            "product" | "products" | "producto" | "productos" | "prod" => Ok(Dimension::Product),
            "region" | "regions" | "región" | "regiones" | "reg" => Ok(Dimension::Region),
            "channel" | "channels" | "canal" | "canales" => Ok(Dimension::Channel),
            _ => Err(ParseDimensionError(s.to_string())),
        }
    }
}

// ============================================================================
// DIMENSION VALUE
// ============================================================================

/// A single value of a dimension.
///
/// The derived ordering puts numbers before text, numbers ascending and
/// text lexicographic, which is the natural order of every dimension domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Number(i32),
    Text(String),
}

impl DimensionValue {
    pub fn as_number(&self) -> Option<i32> {
        match self {
            DimensionValue::Number(n) => Some(*n),
            DimensionValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DimensionValue::Number(_) => None,
            DimensionValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Number(n) => write!(f, "{}", n),
            DimensionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for DimensionValue {
    fn from(value: i32) -> Self {
        DimensionValue::Number(value)
    }
}

impl From<&str> for DimensionValue {
    fn from(value: &str) -> Self {
        DimensionValue::Text(value.to_string())
    }
}

impl From<String> for DimensionValue {
    fn from(value: String) -> Self {
        DimensionValue::Text(value)
    }
}
