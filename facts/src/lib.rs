//! FILENAME: facts/src/lib.rs
//! Sales fact table shared by the cube engine.
//!
//! This crate holds the data side of the OLAP subsystem: the dimensions a
//! sale can be grouped by, the fact record itself, and the immutable table
//! that every cube operation reads from. It knows nothing about aggregation.
//!
//! Layers:
//! - `dimension`: Grouping attributes and their values
//! - `record`: One observed sale event
//! - `table`: Immutable, shareable sequence of records plus domain queries
//! - `error`: Loading and parsing failures

pub mod dimension;
pub mod error;
pub mod record;
pub mod table;

pub use dimension::{Dimension, DimensionValue};
pub use error::{LoadError, ParseDimensionError};
pub use record::FactRecord;
pub use table::{DimensionDomains, FactTable};
