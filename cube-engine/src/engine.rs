//! FILENAME: cube-engine/src/engine.rs
//! Cube Engine - the four OLAP operations over an immutable fact table.
//!
//! Every function here is a pure read: it takes the records (or the table
//! handle) explicitly, builds whatever it needs from scratch, and returns a
//! fresh result. Nothing is cached between calls, so any number of threads
//! may query the same table at once.
//!
//! Algorithm for aggregate views:
//! 1. Fold the records into a `CubeCache` keyed by the definition's
//!    dimensions, materializing every margin combination
//! 2. Collect the observed value paths of each axis, in natural order
//! 3. Flatten each axis into data items, subtotals and a grand total
//! 4. Cross-tabulate: each (row, column) pair is one cache lookup

use facts::{Dimension, DimensionValue, FactRecord, FactTable};
use log::{debug, warn};
use smallvec::SmallVec;

use crate::cache::{CubeCache, CubeKey, Member, ValueId};
use crate::definition::CubeDefinition;
use crate::error::{CubeError, Result};
use crate::selection::{CellSpec, DiceSelection};
use crate::view::{AxisItem, AxisItemType, CellMember, CubeView, DrillThroughResult};

/// Dimensions a drill-through cell must specify by default.
pub const DRILL_DIMENSIONS: [Dimension; 4] = [
    Dimension::Year,
    Dimension::Region,
    Dimension::Product,
    Dimension::Quarter,
];

// ============================================================================
// CUBE
// ============================================================================

/// One aggregated cell, as listed by `Cube::cells`.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeCell {
    /// One member per cube dimension, in definition order.
    pub members: Vec<CellMember>,
    pub value: f64,
}

/// The aggregated cube for one definition and one record set.
#[derive(Debug, Clone)]
pub struct Cube {
    definition: CubeDefinition,
    cache: CubeCache,
}

impl Cube {
    pub fn definition(&self) -> &CubeDefinition {
        &self.definition
    }

    /// Grouping dimensions: rows then columns.
    pub fn dimensions(&self) -> &[Dimension] {
        self.cache.dimensions()
    }

    pub fn record_count(&self) -> usize {
        self.cache.record_count()
    }

    /// Observed values of a cube dimension in ascending order.
    pub fn domain(&self, dimension: Dimension) -> Vec<&DimensionValue> {
        self.cache
            .position(dimension)
            .and_then(|p| self.cache.field(p))
            .map(|f| f.sorted_values())
            .unwrap_or_default()
    }

    /// The aggregate of a cell given one member per cube dimension, in
    /// `dimensions()` order. None when no record contributes, when a value
    /// was never observed, or when the arity does not match.
    pub fn value(&self, members: &[CellMember]) -> Option<f64> {
        if members.len() != self.dimensions().len() {
            return None;
        }
        let key = members
            .iter()
            .enumerate()
            .map(|(position, member)| match member {
                CellMember::Value(v) => self.cache.resolve(position, v),
                CellMember::Margin => Some(Member::Margin),
            })
            .collect::<Option<CubeKey>>()?;
        self.lookup(&key)
    }

    /// The aggregate of a cell given by coordinates; cube dimensions not
    /// mentioned are taken at their margin. None if a coordinate names a
    /// dimension outside the cube.
    pub fn value_at(&self, coordinates: &[(Dimension, DimensionValue)]) -> Option<f64> {
        let mut members = vec![CellMember::Margin; self.dimensions().len()];
        for (dimension, value) in coordinates {
            let position = self.cache.position(*dimension)?;
            members[position] = CellMember::Value(value.clone());
        }
        self.value(&members)
    }

    /// Margin over every dimension. None for an empty record set.
    pub fn grand_total(&self) -> Option<f64> {
        let key: CubeKey = self.dimensions().iter().map(|_| Member::Margin).collect();
        self.lookup(&key)
    }

    /// Every observed cell, margins included, in natural order with margins
    /// after the values they summarize.
    pub fn cells(&self) -> Vec<CubeCell> {
        self.cache
            .sorted_keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.lookup(key)?;
                Some(CubeCell {
                    members: self.to_cell_members(key),
                    value,
                })
            })
            .collect()
    }

    /// Lays the cube out as a two-axis table.
    pub fn to_view(&self) -> CubeView {
        let row_count = self.definition.row_dimensions.len();
        let col_count = self.definition.column_dimensions.len();
        let row_positions: Vec<usize> = (0..row_count).collect();
        let col_positions: Vec<usize> = (row_count..row_count + col_count).collect();

        let row_items = self.build_axis(&row_positions);
        let col_items = self.build_axis(&col_positions);

        let mut cells = Vec::with_capacity(row_items.len());
        for row in &row_items {
            let mut line = Vec::with_capacity(col_items.len());
            for col in &col_items {
                let key: CubeKey = row.iter().chain(col.iter()).copied().collect();
                line.push(self.lookup(&key));
            }
            cells.push(line);
        }

        let view = CubeView {
            row_dimensions: self.definition.row_dimensions.clone(),
            column_dimensions: self.definition.column_dimensions.clone(),
            aggregation: self.definition.aggregation,
            margins_name: self.definition.margins_name.clone(),
            row_headers: row_items
                .iter()
                .map(|members| self.to_axis_item(members, &row_positions))
                .collect(),
            column_headers: col_items
                .iter()
                .map(|members| self.to_axis_item(members, &col_positions))
                .collect(),
            cells,
        };
        debug!(
            "Cube view: {} rows x {} columns from {} records",
            view.row_count(),
            view.col_count(),
            self.record_count()
        );
        view
    }

    fn lookup(&self, key: &[Member]) -> Option<f64> {
        self.cache
            .get(key)
            .and_then(|acc| acc.compute(self.definition.aggregation))
    }

    fn to_cell_members(&self, key: &[Member]) -> Vec<CellMember> {
        key.iter()
            .enumerate()
            .map(|(position, &member)| match self.cache.member_value(position, member) {
                Some(v) => CellMember::Value(v.clone()),
                None => CellMember::Margin,
            })
            .collect()
    }

    fn to_axis_item(&self, members: &[Member], positions: &[usize]) -> AxisItem {
        let item_type = if members.iter().all(Member::is_margin) {
            AxisItemType::GrandTotal
        } else if members.iter().any(Member::is_margin) {
            AxisItemType::Subtotal
        } else {
            AxisItemType::Data
        };
        AxisItem {
            members: members
                .iter()
                .zip(positions.iter())
                .map(|(&member, &position)| match self.cache.member_value(position, member) {
                    Some(v) => CellMember::Value(v.clone()),
                    None => CellMember::Margin,
                })
                .collect(),
            item_type,
        }
    }

    /// Flattens one axis: observed paths in natural order, a subtotal after
    /// each group of an outer dimension, the grand total last.
    fn build_axis(&self, positions: &[usize]) -> Vec<SmallVec<[Member; 5]>> {
        let mut items = Vec::new();
        if !positions.is_empty() {
            let paths = self.cache.observed_paths(positions);
            self.flatten_level(&paths, 0, positions.len(), &mut items);
        }
        items.push(positions.iter().map(|_| Member::Margin).collect());
        items
    }

    fn flatten_level(
        &self,
        paths: &[SmallVec<[ValueId; 5]>],
        depth: usize,
        width: usize,
        out: &mut Vec<SmallVec<[Member; 5]>>,
    ) {
        if depth + 1 == width {
            for path in paths {
                out.push(path.iter().map(|&id| Member::Value(id)).collect());
            }
            return;
        }

        // Paths are sorted, so every group at this depth is contiguous.
        let mut start = 0;
        while start < paths.len() {
            let head = paths[start][depth];
            let end = paths[start..]
                .iter()
                .position(|p| p[depth] != head)
                .map_or(paths.len(), |offset| start + offset);

            self.flatten_level(&paths[start..end], depth + 1, width, out);

            if self.definition.show_subtotals {
                let subtotal = (0..width)
                    .map(|i| {
                        if i <= depth {
                            Member::Value(paths[start][i])
                        } else {
                            Member::Margin
                        }
                    })
                    .collect();
                out.push(subtotal);
            }
            start = end;
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Aggregates records into a cube (CubeBuilder).
pub fn build_cube<'a, I>(records: I, definition: &CubeDefinition) -> Result<Cube>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    definition.validate()?;
    let cache = CubeCache::build(records, &definition.dimensions());
    debug!(
        "Built cube over {:?} with {} aggregates from {} records",
        definition.dimensions(),
        cache.aggregate_count(),
        cache.record_count()
    );
    Ok(Cube {
        definition: definition.clone(),
        cache,
    })
}

/// Two-dimensional cross-tabulation with row, column and grand totals
/// (FaceProjector).
pub fn project_face<'a, I>(records: I, row: Dimension, column: Dimension) -> Result<CubeView>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let cube = build_cube(records, &CubeDefinition::face(row, column))?;
    Ok(cube.to_view())
}

/// Records whose value in every constrained dimension is allowed, in input
/// order (DiceFilter). No constraints returns every record.
pub fn dice<'a, I>(records: I, selection: &DiceSelection) -> Vec<&'a FactRecord>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let result: Vec<&FactRecord> = records
        .into_iter()
        .filter(|record| selection.allows(record))
        .collect();
    debug!(
        "Dice over {:?} kept {} records",
        selection.constrained_dimensions(),
        result.len()
    );
    result
}

/// The raw records behind one fully specified cell (DrillThrough).
///
/// `dimensions` lists what the cell must pin down; any of them without a
/// value is an `IncompleteCell` error. Every value the cell carries is
/// honored, required or not. The sales of the returned records sum to the
/// cube value of that cell with every unspecified dimension at its margin.
pub fn drill_through<'a>(
    table: &'a FactTable,
    cell: &CellSpec,
    dimensions: &[Dimension],
) -> Result<Vec<&'a FactRecord>> {
    let missing = cell.missing(dimensions);
    if !missing.is_empty() {
        warn!("Rejected drill-through with missing dimensions {:?}", missing);
        return Err(CubeError::IncompleteCell { missing });
    }

    // Dice narrows on every specified dimension but the last required one,
    // which is checked by exact equality on the narrowed set.
    let exact = dimensions
        .last()
        .and_then(|&d| cell.get(d).map(|v| (d, v)));
    let diced: Vec<Dimension> = cell
        .entries()
        .into_iter()
        .map(|(d, _)| d)
        .filter(|&d| exact.map_or(true, |(e, _)| e != d))
        .collect();

    let narrowed = dice(table, &cell.to_selection(&diced));
    let records: Vec<&FactRecord> = match exact {
        Some((dimension, value)) => narrowed
            .into_iter()
            .filter(|record| record.matches(dimension, value))
            .collect(),
        None => narrowed,
    };

    debug!("Drill-through matched {} records", records.len());
    Ok(records)
}

/// Dice the table, then aggregate the section with the section layout.
pub fn section_view(table: &FactTable, selection: &DiceSelection) -> Result<CubeView> {
    section_view_with(table, selection, &CubeDefinition::section())
}

/// Like `section_view`, with an explicit layout.
pub fn section_view_with(
    table: &FactTable,
    selection: &DiceSelection,
    definition: &CubeDefinition,
) -> Result<CubeView> {
    Ok(section_cube(table, selection, definition)?.to_view())
}

/// Dice the table and aggregate the surviving records into a cube.
pub fn section_cube(
    table: &FactTable,
    selection: &DiceSelection,
    definition: &CubeDefinition,
) -> Result<Cube> {
    let section = dice(table, selection);
    build_cube(section.iter().copied(), definition)
}

/// Drill-through packaged for display with headers, count and total.
pub fn drill_result(table: &FactTable, cell: &CellSpec) -> Result<DrillThroughResult> {
    let records = drill_through(table, cell, &DRILL_DIMENSIONS)?;
    Ok(DrillThroughResult::new(
        cell.entries(),
        records.into_iter().cloned().collect(),
    ))
}
