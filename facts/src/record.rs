//! FILENAME: facts/src/record.rs
//! Fact Record - one observed sale event.

use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, DimensionValue};

/// A single sale. Every field is always populated; the table never holds
/// partial records.
///
/// Field aliases accept the column labels of the source dataset so that a
/// dataframe exported as JSON records can be loaded unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    #[serde(alias = "Año", alias = "anio")]
    pub year: i32,

    #[serde(alias = "Trimestre", alias = "trimestre")]
    pub quarter: u8,

    #[serde(alias = "Producto", alias = "producto")]
    pub product: String,

    #[serde(alias = "Región", alias = "Region")]
    pub region: String,

    #[serde(alias = "Canal", alias = "canal")]
    pub channel: String,

    /// The measure. Non-negative.
    #[serde(alias = "Ventas", alias = "ventas")]
    pub sales: f64,
}

impl FactRecord {
    pub fn new(
        year: i32,
        quarter: u8,
        product: impl Into<String>,
        region: impl Into<String>,
        channel: impl Into<String>,
        sales: f64,
    ) -> Self {
        FactRecord {
            year,
            quarter,
            product: product.into(),
            region: region.into(),
            channel: channel.into(),
            sales,
        }
    }

    /// Returns this record's value for a dimension.
    pub fn value(&self, dimension: Dimension) -> DimensionValue {
        match dimension {
            Dimension::Year => DimensionValue::Number(self.year),
            Dimension::Quarter => DimensionValue::Number(i32::from(self.quarter)),
            Dimension::Product => DimensionValue::Text(self.product.clone()),
            Dimension::Region => DimensionValue::Text(self.region.clone()),
            Dimension::Channel => DimensionValue::Text(self.channel.clone()),
        }
    }

    /// Exact-match test against a dimension value, without allocating.
    pub fn matches(&self, dimension: Dimension, value: &DimensionValue) -> bool {
        match (dimension, value) {
            (Dimension::Year, DimensionValue::Number(n)) => self.year == *n,
            (Dimension::Quarter, DimensionValue::Number(n)) => i32::from(self.quarter) == *n,
            (Dimension::Product, DimensionValue::Text(s)) => self.product == *s,
            (Dimension::Region, DimensionValue::Text(s)) => self.region == *s,
            (Dimension::Channel, DimensionValue::Text(s)) => self.channel == *s,
            // A value of the wrong kind can never match.
            _ => false,
        }
    }

    /// Checks the record-level invariants: quarter in 1..=4 and a finite,
    /// non-negative measure.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=4).contains(&self.quarter) {
            return Err(format!("quarter {} is outside 1..=4", self.quarter));
        }
        if !self.sales.is_finite() || self.sales < 0.0 {
            return Err(format!("sales {} is not a non-negative number", self.sales));
        }
        Ok(())
    }
}
