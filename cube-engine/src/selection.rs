//! FILENAME: cube-engine/src/selection.rs
//! Selections - strongly typed dice constraints and drill-through cells.
//!
//! Raw request values (lists of strings keyed by form field) are validated
//! here, once, so the engine only ever sees well-typed selections.

use facts::{Dimension, DimensionValue, FactRecord};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{CubeError, Result};

/// Form field prefixes used by the section and drill pages.
const FORM_PREFIXES: [&str; 2] = ["seccion_", "drill_"];

/// Resolves a form key such as `seccion_anios` or `drill_reg` to a dimension.
fn parse_form_key(key: &str) -> Result<Dimension> {
    let trimmed = key.trim();
    let name = FORM_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    name.parse::<Dimension>()
        .map_err(|_| CubeError::UnknownDimension(key.to_string()))
}

fn parse_form_value(dimension: Dimension, raw: &str) -> Result<DimensionValue> {
    dimension
        .parse_value(raw)
        .ok_or_else(|| CubeError::InvalidValue {
            dimension,
            raw: raw.to_string(),
        })
}

// ============================================================================
// DICE SELECTION
// ============================================================================

/// Allowed values per dimension. A dimension without an entry is
/// unconstrained; a dimension with an empty set admits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSelection {
    constraints: FxHashMap<Dimension, FxHashSet<DimensionValue>>,
}

impl DiceSelection {
    /// No constraints: every record passes.
    pub fn new() -> Self {
        DiceSelection::default()
    }

    /// Constrains a dimension to the given values, replacing any earlier
    /// constraint on it.
    pub fn with<V, I>(mut self, dimension: Dimension, values: I) -> Self
    where
        V: Into<DimensionValue>,
        I: IntoIterator<Item = V>,
    {
        self.constraints
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_years<I: IntoIterator<Item = i32>>(self, years: I) -> Self {
        self.with(Dimension::Year, years)
    }

    pub fn with_quarters<I: IntoIterator<Item = u8>>(self, quarters: I) -> Self {
        self.with(Dimension::Quarter, quarters.into_iter().map(i32::from))
    }

    pub fn with_products<S: Into<String>, I: IntoIterator<Item = S>>(self, products: I) -> Self {
        self.with(Dimension::Product, products.into_iter().map(Into::<String>::into))
    }

    pub fn with_regions<S: Into<String>, I: IntoIterator<Item = S>>(self, regions: I) -> Self {
        self.with(Dimension::Region, regions.into_iter().map(Into::<String>::into))
    }

    pub fn with_channels<S: Into<String>, I: IntoIterator<Item = S>>(self, channels: I) -> Self {
        self.with(Dimension::Channel, channels.into_iter().map(Into::<String>::into))
    }

    /// The allowed set of a dimension, or None when it is unconstrained.
    pub fn allowed(&self, dimension: Dimension) -> Option<&FxHashSet<DimensionValue>> {
        self.constraints.get(&dimension)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Constrained dimensions in canonical order.
    pub fn constrained_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .iter()
            .copied()
            .filter(|d| self.constraints.contains_key(d))
            .collect()
    }

    /// Whether a record's value in every constrained dimension is allowed.
    pub fn allows(&self, record: &FactRecord) -> bool {
        self.constraints
            .iter()
            .all(|(&dim, allowed)| allowed.iter().any(|v| record.matches(dim, v)))
    }

    /// Builds a selection from raw form pairs. Repeated keys accumulate
    /// values; blank values are ignored.
    pub fn from_form<K, V, I>(pairs: I) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut selection = DiceSelection::new();
        for (key, raw) in pairs {
            let dimension = parse_form_key(key.as_ref())?;
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                continue;
            }
            let value = parse_form_value(dimension, raw)?;
            selection.constraints.entry(dimension).or_default().insert(value);
        }
        Ok(selection)
    }
}

// ============================================================================
// CELL SPEC
// ============================================================================

/// One fully or partially specified cube cell: at most one value per
/// dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellSpec {
    values: SmallVec<[(Dimension, DimensionValue); 5]>,
}

/// Equality ignores the order in which dimensions were set.
impl PartialEq for CellSpec {
    fn eq(&self, other: &Self) -> bool {
        self.entries() == other.entries()
    }
}

impl Eq for CellSpec {}

impl CellSpec {
    pub fn new() -> Self {
        CellSpec::default()
    }

    /// Sets the value of a dimension, replacing any earlier one.
    pub fn with(mut self, dimension: Dimension, value: impl Into<DimensionValue>) -> Self {
        self.set(dimension, value.into());
        self
    }

    pub fn year(self, year: i32) -> Self {
        self.with(Dimension::Year, year)
    }

    pub fn quarter(self, quarter: u8) -> Self {
        self.with(Dimension::Quarter, i32::from(quarter))
    }

    pub fn product(self, product: &str) -> Self {
        self.with(Dimension::Product, product)
    }

    pub fn region(self, region: &str) -> Self {
        self.with(Dimension::Region, region)
    }

    pub fn channel(self, channel: &str) -> Self {
        self.with(Dimension::Channel, channel)
    }

    fn set(&mut self, dimension: Dimension, value: DimensionValue) {
        match self.values.iter_mut().find(|(d, _)| *d == dimension) {
            Some(entry) => entry.1 = value,
            None => self.values.push((dimension, value)),
        }
    }

    pub fn get(&self, dimension: Dimension) -> Option<&DimensionValue> {
        self.values
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, v)| v)
    }

    /// Dimensions from `required` that have no value, in the given order.
    pub fn missing(&self, required: &[Dimension]) -> Vec<Dimension> {
        required
            .iter()
            .copied()
            .filter(|&d| self.get(d).is_none())
            .collect()
    }

    /// Specified (dimension, value) pairs in canonical dimension order.
    pub fn entries(&self) -> Vec<(Dimension, DimensionValue)> {
        let mut entries: Vec<(Dimension, DimensionValue)> = self.values.to_vec();
        entries.sort_by_key(|(d, _)| *d);
        entries
    }

    /// Exact match on every specified dimension.
    pub fn matches(&self, record: &FactRecord) -> bool {
        self.values.iter().all(|(d, v)| record.matches(*d, v))
    }

    /// Single-value dice constraints for the given dimensions. Dimensions
    /// without a value are left out.
    pub fn to_selection(&self, dimensions: &[Dimension]) -> DiceSelection {
        dimensions
            .iter()
            .filter_map(|&d| self.get(d).map(|v| (d, v.clone())))
            .fold(DiceSelection::new(), |selection, (d, v)| selection.with(d, [v]))
    }

    /// Builds a cell from raw form pairs. A later key overrides an earlier
    /// one; blank values leave the dimension unspecified.
    pub fn from_form<K, V, I>(pairs: I) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut cell = CellSpec::new();
        for (key, raw) in pairs {
            let dimension = parse_form_key(key.as_ref())?;
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                continue;
            }
            let value = parse_form_value(dimension, raw)?;
            cell.set(dimension, value);
        }
        Ok(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_checks_every_constraint() {
        let record = FactRecord::new(2024, 1, "A", "Norte", "X", 1.0);
        assert!(DiceSelection::new().allows(&record));
        assert!(DiceSelection::new()
            .with_years([2024, 2025])
            .with_regions(["Norte"])
            .allows(&record));
        assert!(!DiceSelection::new()
            .with_years([2024])
            .with_regions(["Sur"])
            .allows(&record));
        assert!(!DiceSelection::new()
            .with_products(Vec::<String>::new())
            .allows(&record));
    }

    #[test]
    fn test_from_form_accepts_page_keys() {
        let form = [
            ("seccion_anios", "2024"),
            ("seccion_anios", "2025"),
            ("seccion_regiones", "Norte"),
            ("seccion_regiones", ""),
        ];
        let selection = DiceSelection::from_form(form).unwrap();
        let expected = DiceSelection::new()
            .with_years([2024, 2025])
            .with_regions(["Norte"]);
        assert_eq!(selection, expected);
        assert_eq!(
            selection.constrained_dimensions(),
            vec![Dimension::Year, Dimension::Region]
        );
    }

    #[test]
    fn test_from_form_rejects_malformed_input() {
        let bad_year = DiceSelection::from_form([("anios", "dos mil")]);
        assert!(matches!(
            bad_year,
            Err(CubeError::InvalidValue { dimension: Dimension::Year, .. })
        ));

        let bad_key = DiceSelection::from_form([("ventas", "10")]);
        assert!(matches!(bad_key, Err(CubeError::UnknownDimension(_))));
    }

    #[test]
    fn test_from_form_rejects_unknown_key_with_blank_value() {
        let selection = DiceSelection::from_form([("anios", "2024"), ("ventas", "")]);
        assert!(matches!(selection, Err(CubeError::UnknownDimension(_))));

        let cell = CellSpec::from_form([("drill_anio", "2024"), ("drill_ventas", " ")]);
        assert!(matches!(cell, Err(CubeError::UnknownDimension(_))));
    }

    #[test]
    fn test_cell_from_form_and_missing() {
        let form = vec![
            ("drill_anio".to_string(), "2024".to_string()),
            ("drill_trim".to_string(), "1".to_string()),
            ("drill_prod".to_string(), "A".to_string()),
            ("drill_reg".to_string(), "   ".to_string()),
        ];
        let cell = CellSpec::from_form(form).unwrap();
        assert_eq!(cell.get(Dimension::Year), Some(&DimensionValue::Number(2024)));
        assert_eq!(cell.get(Dimension::Quarter), Some(&DimensionValue::Number(1)));
        assert_eq!(
            cell.missing(&[Dimension::Year, Dimension::Region, Dimension::Product]),
            vec![Dimension::Region]
        );
    }

    #[test]
    fn test_cell_with_replaces_value() {
        let cell = CellSpec::new().year(2024).region("Norte").year(2025);
        assert_eq!(cell.get(Dimension::Year), Some(&DimensionValue::Number(2025)));
        assert_eq!(
            cell.entries(),
            vec![
                (Dimension::Year, DimensionValue::Number(2025)),
                (Dimension::Region, DimensionValue::from("Norte")),
            ]
        );
    }

    #[test]
    fn test_cell_to_selection() {
        let cell = CellSpec::new().year(2024).region("Norte").quarter(2);
        let selection = cell.to_selection(&[Dimension::Year, Dimension::Region, Dimension::Product]);
        assert_eq!(
            selection,
            DiceSelection::new().with_years([2024]).with_regions(["Norte"])
        );
    }
}
