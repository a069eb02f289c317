//! FILENAME: cube-engine/src/lib.rs
//! OLAP cube subsystem over the sales fact table.
//!
//! This crate provides the aggregation and selection engine as a standalone
//! module, separate from the data it reads. It depends on `facts` only for
//! shared types (FactRecord, FactTable, Dimension).
//!
//! Layers:
//! - `definition`: Serializable configuration (what a cube view IS)
//! - `selection`: Typed dice constraints and drill-through cells
//! - `cache`: Per-query interning and margin aggregation (HOW we compute)
//! - `view`: Renderable output (WHAT we display)
//! - `engine`: Cube, face, dice and drill-through operations
//! - `config`: Default selections for requests that carry none
//! - `queries`: Page-level query surface over a shared table

pub mod cache;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod queries;
pub mod selection;
pub mod view;

pub use cache::{AggregateAccumulator, CubeCache, CubeKey, DimensionCache, Member, ValueId};
pub use config::{DrillDefaults, SectionDefaults, ViewDefaults};
pub use definition::*;
pub use engine::{
    build_cube, dice, drill_result, drill_through, project_face, section_cube,
    section_view, section_view_with, Cube, CubeCell, DRILL_DIMENSIONS,
};
pub use error::{CubeError, Result};
pub use queries::{CubeQueries, SectionResult};
pub use selection::{CellSpec, DiceSelection};
pub use view::*;
