//! FILENAME: cube-engine/src/config.rs
//! View defaults - the selections used when a request carries none.

use facts::Dimension;
use serde::{Deserialize, Serialize};

use crate::definition::{CubeDefinition, DEFAULT_MARGINS_NAME};
use crate::error::Result;
use crate::selection::{CellSpec, DiceSelection};

/// Default section (dice) selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDefaults {
    pub years: Vec<i32>,
    pub regions: Vec<String>,
}

impl Default for SectionDefaults {
    fn default() -> Self {
        SectionDefaults {
            years: vec![2024, 2025],
            regions: vec!["Norte".to_string(), "Sur".to_string()],
        }
    }
}

/// Default drill-through cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillDefaults {
    pub year: i32,
    pub quarter: u8,
    pub product: String,
    pub region: String,
}

impl Default for DrillDefaults {
    fn default() -> Self {
        DrillDefaults {
            year: 2024,
            quarter: 1,
            product: "A".to_string(),
            region: "Norte".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    pub section: SectionDefaults,
    pub drill: DrillDefaults,
    pub face_rows: Dimension,
    pub face_columns: Dimension,
    pub margins_name: String,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        ViewDefaults {
            section: SectionDefaults::default(),
            drill: DrillDefaults::default(),
            face_rows: Dimension::Year,
            face_columns: Dimension::Region,
            margins_name: DEFAULT_MARGINS_NAME.to_string(),
        }
    }
}

impl ViewDefaults {
    /// Parses overrides; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn section_selection(&self) -> DiceSelection {
        DiceSelection::new()
            .with_years(self.section.years.iter().copied())
            .with_regions(self.section.regions.iter().cloned())
    }

    pub fn drill_cell(&self) -> CellSpec {
        CellSpec::new()
            .year(self.drill.year)
            .quarter(self.drill.quarter)
            .product(&self.drill.product)
            .region(&self.drill.region)
    }

    pub fn full_cube_definition(&self) -> CubeDefinition {
        CubeDefinition::full_cube().with_margins_name(self.margins_name.clone())
    }

    pub fn face_definition(&self) -> CubeDefinition {
        CubeDefinition::face(self.face_rows, self.face_columns)
            .with_margins_name(self.margins_name.clone())
    }

    pub fn section_definition(&self) -> CubeDefinition {
        CubeDefinition::section().with_margins_name(self.margins_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CubeError;

    #[test]
    fn test_defaults() {
        let defaults = ViewDefaults::default();
        assert_eq!(
            defaults.section_selection(),
            DiceSelection::new()
                .with_years([2024, 2025])
                .with_regions(["Norte", "Sur"])
        );
        assert_eq!(
            defaults.drill_cell(),
            CellSpec::new().year(2024).quarter(1).product("A").region("Norte")
        );
        assert_eq!(defaults.face_definition(), CubeDefinition::face_default());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{"section": {"regions": ["Este"]}, "margins_name": "All", "face_columns": "Channel"}"#;
        let defaults = ViewDefaults::from_json_str(json).unwrap();
        assert_eq!(defaults.section.years, vec![2024, 2025]);
        assert_eq!(defaults.section.regions, vec!["Este".to_string()]);
        assert_eq!(defaults.drill, DrillDefaults::default());
        assert_eq!(defaults.face_definition().column_dimensions, vec![Dimension::Channel]);
        assert_eq!(defaults.section_definition().margins_name, "All");
    }

    #[test]
    fn test_malformed_config() {
        let result = ViewDefaults::from_json_str(r#"{"face_rows": "Ventas"}"#);
        assert!(matches!(result, Err(CubeError::Config(_))));
    }
}
