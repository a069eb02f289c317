//! FILENAME: facts/src/table.rs
//! Fact Table - the immutable sequence of records every cube query reads.
//!
//! The table is loaded once and never mutated. It is a cheap handle over a
//! shared slice, so it can be cloned into any number of worker threads and
//! read concurrently without locking.

use std::io::Read;
use std::sync::Arc;

use log::info;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, DimensionValue};
use crate::error::LoadError;
use crate::record::FactRecord;

// ============================================================================
// FACT TABLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct FactTable {
    records: Arc<[FactRecord]>,
}

impl FactTable {
    /// Wraps already-materialized records. Record order is preserved.
    pub fn new(records: Vec<FactRecord>) -> Self {
        FactTable {
            records: Arc::from(records),
        }
    }

    /// Like `new`, but checks every record's invariants first.
    pub fn try_new(records: Vec<FactRecord>) -> Result<Self, LoadError> {
        for (index, record) in records.iter().enumerate() {
            record
                .validate()
                .map_err(|reason| LoadError::InvalidRecord { index, reason })?;
        }
        Ok(Self::new(records))
    }

    /// Loads a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let records: Vec<FactRecord> = serde_json::from_str(json)?;
        let table = Self::try_new(records)?;
        info!("Loaded fact table with {} records", table.len());
        Ok(table)
    }

    /// Loads a JSON array of records from any reader (file, socket, ...).
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let records: Vec<FactRecord> = serde_json::from_reader(reader)?;
        let table = Self::try_new(records)?;
        info!("Loaded fact table with {} records", table.len());
        Ok(table)
    }

    pub fn records(&self) -> &[FactRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FactRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the measure over every record.
    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sales).sum()
    }

    /// Distinct values of a dimension in ascending natural order.
    pub fn domain(&self, dimension: Dimension) -> Vec<DimensionValue> {
        let mut seen: FxHashSet<DimensionValue> = FxHashSet::default();
        for record in self.records.iter() {
            seen.insert(record.value(dimension));
        }
        let mut values: Vec<DimensionValue> = seen.into_iter().collect();
        values.sort();
        values
    }

    /// Distinct values of every dimension, for populating selection menus.
    pub fn domains(&self) -> DimensionDomains {
        DimensionDomains {
            years: numbers(self.domain(Dimension::Year)),
            quarters: numbers(self.domain(Dimension::Quarter)),
            products: texts(self.domain(Dimension::Product)),
            regions: texts(self.domain(Dimension::Region)),
            channels: texts(self.domain(Dimension::Channel)),
        }
    }
}

impl Default for FactTable {
    fn default() -> Self {
        FactTable::new(Vec::new())
    }
}

impl From<Vec<FactRecord>> for FactTable {
    fn from(records: Vec<FactRecord>) -> Self {
        FactTable::new(records)
    }
}

impl<'a> IntoIterator for &'a FactTable {
    type Item = &'a FactRecord;
    type IntoIter = std::slice::Iter<'a, FactRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn numbers(values: Vec<DimensionValue>) -> Vec<i32> {
    values.iter().filter_map(DimensionValue::as_number).collect()
}

fn texts(values: Vec<DimensionValue>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            DimensionValue::Text(s) => Some(s),
            DimensionValue::Number(_) => None,
        })
        .collect()
}

// ============================================================================
// DIMENSION DOMAINS
// ============================================================================

/// The observed values of every dimension, each list sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDomains {
    pub years: Vec<i32>,
    pub quarters: Vec<i32>,
    pub products: Vec<String>,
    pub regions: Vec<String>,
    pub channels: Vec<String>,
}

impl DimensionDomains {
    /// Returns the domain of one dimension as generic values.
    pub fn get(&self, dimension: Dimension) -> Vec<DimensionValue> {
        match dimension {
            Dimension::Year => self.years.iter().copied().map(DimensionValue::Number).collect(),
            Dimension::Quarter => self.quarters.iter().copied().map(DimensionValue::Number).collect(),
            Dimension::Product => self.products.iter().cloned().map(DimensionValue::Text).collect(),
            Dimension::Region => self.regions.iter().cloned().map(DimensionValue::Text).collect(),
            Dimension::Channel => self.channels.iter().cloned().map(DimensionValue::Text).collect(),
        }
    }
}
