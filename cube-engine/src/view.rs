//! FILENAME: cube-engine/src/view.rs
//! Cube View - Renderable output of the engine.
//!
//! A view is a labeled two-axis table. Each axis is a flat list of items
//! (data items, subtotals after their children, the grand total last) and
//! every (row, column) intersection holds either a number or "no value".

use std::fmt;
use std::fmt::Write as _;

use facts::{Dimension, DimensionValue, FactRecord};
use serde::{Deserialize, Serialize};

use crate::definition::AggregationType;

// ============================================================================
// MEMBERS AND AXIS ITEMS
// ============================================================================

/// A caller-facing cell coordinate component: a concrete value, or the
/// margin over all values of the dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellMember {
    Value(DimensionValue),
    Margin,
}

impl CellMember {
    pub fn is_margin(&self) -> bool {
        matches!(self, CellMember::Margin)
    }
}

impl From<DimensionValue> for CellMember {
    fn from(value: DimensionValue) -> Self {
        CellMember::Value(value)
    }
}

impl From<i32> for CellMember {
    fn from(value: i32) -> Self {
        CellMember::Value(DimensionValue::Number(value))
    }
}

impl From<&str> for CellMember {
    fn from(value: &str) -> Self {
        CellMember::Value(DimensionValue::from(value))
    }
}

/// The role of an axis item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisItemType {
    /// Finest grain: a value for every dimension on the axis.
    Data,
    /// A value for some leading dimensions, margin for the rest.
    Subtotal,
    /// Margin for every dimension on the axis.
    GrandTotal,
}

/// One row or column header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisItem {
    /// One member per axis dimension, outermost first.
    pub members: Vec<CellMember>,
    pub item_type: AxisItemType,
}

impl AxisItem {
    /// Header text, members joined with " / ".
    pub fn label(&self, margins_name: &str) -> String {
        if self.members.is_empty() {
            return margins_name.to_string();
        }
        self.members
            .iter()
            .map(|m| match m {
                CellMember::Value(v) => v.to_string(),
                CellMember::Margin => margins_name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

// ============================================================================
// CUBE VIEW
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeView {
    pub row_dimensions: Vec<Dimension>,
    pub column_dimensions: Vec<Dimension>,
    pub aggregation: AggregationType,
    pub margins_name: String,
    pub row_headers: Vec<AxisItem>,
    pub column_headers: Vec<AxisItem>,
    /// `cells[row][col]`; None means no record contributes to the cell.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CubeView {
    pub fn row_count(&self) -> usize {
        self.row_headers.len()
    }

    pub fn col_count(&self) -> usize {
        self.column_headers.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Looks a cell up by its row and column members.
    pub fn value(&self, row_members: &[CellMember], col_members: &[CellMember]) -> Option<f64> {
        let row = self.row_headers.iter().position(|h| h.members == row_members)?;
        let col = self.column_headers.iter().position(|h| h.members == col_members)?;
        self.cell(row, col)
    }

    /// The bottom-right cell: margin on both axes.
    pub fn grand_total(&self) -> Option<f64> {
        let row = self
            .row_headers
            .iter()
            .position(|h| h.item_type == AxisItemType::GrandTotal)?;
        let col = self
            .column_headers
            .iter()
            .position(|h| h.item_type == AxisItemType::GrandTotal)?;
        self.cell(row, col)
    }

    /// Plain-text rendering, `-` for cells without a value, amounts with
    /// thousands separators and two decimals.
    pub fn render_text(&self) -> String {
        let corner = self
            .row_dimensions
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join(" / ");

        let mut table: Vec<Vec<String>> = Vec::with_capacity(self.row_count() + 1);
        let mut header = vec![corner];
        header.extend(self.column_headers.iter().map(|h| h.label(&self.margins_name)));
        table.push(header);

        for (r, row_header) in self.row_headers.iter().enumerate() {
            let mut line = vec![row_header.label(&self.margins_name)];
            for c in 0..self.col_count() {
                line.push(match self.cell(r, c) {
                    Some(v) => format_amount(v),
                    None => "-".to_string(),
                });
            }
            table.push(line);
        }

        let widths: Vec<usize> = (0..table[0].len())
            .map(|c| table.iter().map(|line| line[c].chars().count()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for line in &table {
            let cells: Vec<String> = line
                .iter()
                .zip(widths.iter())
                .enumerate()
                .map(|(i, (text, &w))| {
                    if i == 0 {
                        format!("{:<w$}", text, w = w)
                    } else {
                        format!("{:>w$}", text, w = w)
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
        out
    }
}

/// Formats an amount as `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

impl fmt::Display for CubeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

// ============================================================================
// DRILL-THROUGH RESULT
// ============================================================================

/// The raw records behind one cube cell, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillThroughResult {
    /// The requested cell, one entry per dimension.
    pub cell: Vec<(Dimension, DimensionValue)>,

    /// Column headers for the record table.
    pub headers: Vec<String>,

    pub records: Vec<FactRecord>,

    pub total_count: usize,

    /// Sum of the measure over `records`; equals the cube cell value.
    pub total_sales: f64,
}

impl DrillThroughResult {
    pub fn new(cell: Vec<(Dimension, DimensionValue)>, records: Vec<FactRecord>) -> Self {
        let mut headers: Vec<String> = Dimension::ALL
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        headers.push("Sales".to_string());

        DrillThroughResult {
            cell,
            headers,
            total_count: records.len(),
            total_sales: records.iter().map(|r| r.sales).sum(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
