//! FILENAME: cube-engine/src/queries.rs
//! Query surface for a presentation layer.
//!
//! `CubeQueries` pairs the shared fact table with the view defaults and
//! answers the four page-level questions: the full cube, one face, a diced
//! section and a drill-through. It holds no mutable state, so one instance
//! can be cloned into every request handler.

use facts::{DimensionDomains, FactTable};

use crate::config::ViewDefaults;
use crate::engine::{build_cube, drill_result, section_cube};
use crate::error::Result;
use crate::selection::{CellSpec, DiceSelection};
use crate::view::{CubeView, DrillThroughResult};

/// A diced section together with the selection that produced it.
#[derive(Debug, Clone)]
pub struct SectionResult {
    pub selection: DiceSelection,
    pub record_count: usize,
    pub view: CubeView,
}

#[derive(Debug, Clone)]
pub struct CubeQueries {
    table: FactTable,
    defaults: ViewDefaults,
}

impl CubeQueries {
    pub fn new(table: FactTable) -> Self {
        CubeQueries::with_defaults(table, ViewDefaults::default())
    }

    pub fn with_defaults(table: FactTable, defaults: ViewDefaults) -> Self {
        CubeQueries { table, defaults }
    }

    pub fn table(&self) -> &FactTable {
        &self.table
    }

    pub fn defaults(&self) -> &ViewDefaults {
        &self.defaults
    }

    /// Distinct values of every dimension, for selection menus.
    pub fn options(&self) -> DimensionDomains {
        self.table.domains()
    }

    pub fn full_cube(&self) -> Result<CubeView> {
        let cube = build_cube(&self.table, &self.defaults.full_cube_definition())?;
        Ok(cube.to_view())
    }

    pub fn face(&self) -> Result<CubeView> {
        let cube = build_cube(&self.table, &self.defaults.face_definition())?;
        Ok(cube.to_view())
    }

    /// Dices the table and aggregates the section. Without a selection the
    /// configured default is used.
    pub fn section(&self, selection: Option<DiceSelection>) -> Result<SectionResult> {
        let selection = selection.unwrap_or_else(|| self.defaults.section_selection());
        let cube = section_cube(&self.table, &selection, &self.defaults.section_definition())?;
        Ok(SectionResult {
            record_count: cube.record_count(),
            view: cube.to_view(),
            selection,
        })
    }

    /// Raw records of one cell. Without a cell the configured default is
    /// used; a partial cell is an error, never silently completed.
    pub fn drill(&self, cell: Option<CellSpec>) -> Result<DrillThroughResult> {
        let cell = cell.unwrap_or_else(|| self.defaults.drill_cell());
        drill_result(&self.table, &cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CubeError;
    use facts::FactRecord;

    fn create_test_queries() -> CubeQueries {
        CubeQueries::new(FactTable::new(vec![
            FactRecord::new(2024, 1, "A", "Norte", "X", 100.0),
            FactRecord::new(2024, 1, "A", "Norte", "Y", 50.0),
            FactRecord::new(2024, 2, "A", "Sur", "X", 30.0),
            FactRecord::new(2023, 3, "B", "Norte", "X", 5.0),
        ]))
    }

    #[test]
    fn test_default_section_and_drill() {
        let queries = create_test_queries();

        let section = queries.section(None).unwrap();
        assert_eq!(section.record_count, 3);
        assert_eq!(section.view.grand_total(), Some(180.0));

        let drill = queries.drill(None).unwrap();
        assert_eq!(drill.total_count, 2);
        assert_eq!(drill.total_sales, 150.0);
    }

    #[test]
    fn test_partial_drill_is_rejected() {
        let queries = create_test_queries();
        let result = queries.drill(Some(CellSpec::new().year(2024)));
        assert!(matches!(result, Err(CubeError::IncompleteCell { .. })));
    }

    #[test]
    fn test_drill_form_with_channel() {
        let queries = create_test_queries();
        let cell = CellSpec::from_form([
            ("drill_anio", "2024"),
            ("drill_trim", "1"),
            ("drill_prod", "A"),
            ("drill_reg", "Norte"),
            ("canal", "Y"),
        ])
        .unwrap();
        let drill = queries.drill(Some(cell)).unwrap();
        assert_eq!(drill.total_count, 1);
        assert_eq!(drill.total_sales, 50.0);
        assert_eq!(drill.records[0].channel, "Y");
    }

    #[test]
    fn test_full_cube_and_face_totals() {
        let queries = create_test_queries();
        assert_eq!(queries.full_cube().unwrap().grand_total(), Some(185.0));
        assert_eq!(queries.face().unwrap().grand_total(), Some(185.0));
        assert_eq!(queries.options().years, vec![2023, 2024]);
    }
}
