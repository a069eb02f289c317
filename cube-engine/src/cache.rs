//! FILENAME: cube-engine/src/cache.rs
//! Cube Cache - the per-query aggregation structure.
//!
//! The cache is built fresh for every query and discarded with the result:
//! - Each distinct dimension value is interned once and referenced by id
//! - Every record is folded into all margin combinations of its key, so
//!   subtotals at any nesting and the grand total are plain lookups
//! - Nothing is shared or kept between queries

use std::cmp::Ordering;

use facts::{Dimension, DimensionValue, FactRecord};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::AggregationType;

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within one dimension's value store.
pub type ValueId = u32;

/// One component of a cube key: either a concrete dimension value or the
/// margin over all values of that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Member {
    Value(ValueId),
    Margin,
}

impl Member {
    pub fn is_margin(&self) -> bool {
        matches!(self, Member::Margin)
    }
}

/// A cube key: one member per grouping dimension, in definition order.
pub type CubeKey = SmallVec<[Member; 5]>;

/// Interned values of a single dimension.
#[derive(Debug, Clone)]
pub struct DimensionCache {
    pub dimension: Dimension,

    /// Map from value to its id (for deduplication during build).
    value_to_id: FxHashMap<DimensionValue, ValueId>,

    /// Values indexed by id, in first-seen order.
    id_to_value: Vec<DimensionValue>,

    /// Ids in ascending value order.
    sorted_ids: Vec<ValueId>,

    /// Position of each id in `sorted_ids`.
    rank: Vec<u32>,
}

impl DimensionCache {
    pub fn new(dimension: Dimension) -> Self {
        DimensionCache {
            dimension,
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
            sorted_ids: Vec::new(),
            rank: Vec::new(),
        }
    }

    /// Interns a value and returns its id.
    pub fn intern(&mut self, value: DimensionValue) -> ValueId {
        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }
        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    /// Finds the id of an already interned value.
    pub fn lookup(&self, value: &DimensionValue) -> Option<ValueId> {
        self.value_to_id.get(value).copied()
    }

    pub fn get_value(&self, id: ValueId) -> Option<&DimensionValue> {
        self.id_to_value.get(id as usize)
    }

    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// All ids in ascending value order.
    pub fn sorted_ids(&self) -> &[ValueId] {
        &self.sorted_ids
    }

    /// Distinct values in ascending order.
    pub fn sorted_values(&self) -> Vec<&DimensionValue> {
        self.sorted_ids
            .iter()
            .map(|&id| &self.id_to_value[id as usize])
            .collect()
    }

    /// Orders two members: values by their natural order, margin last.
    pub fn compare_members(&self, a: Member, b: Member) -> Ordering {
        match (a, b) {
            (Member::Value(x), Member::Value(y)) => self.rank_of(x).cmp(&self.rank_of(y)),
            (Member::Value(_), Member::Margin) => Ordering::Less,
            (Member::Margin, Member::Value(_)) => Ordering::Greater,
            (Member::Margin, Member::Margin) => Ordering::Equal,
        }
    }

    fn rank_of(&self, id: ValueId) -> u32 {
        self.rank.get(id as usize).copied().unwrap_or(u32::MAX)
    }

    /// Rebuilds the sorted order. Called once after all records are interned.
    fn rebuild_sort_order(&mut self) {
        self.sorted_ids = (0..self.id_to_value.len() as ValueId).collect();
        let values = &self.id_to_value;
        self.sorted_ids
            .sort_by(|&a, &b| values[a as usize].cmp(&values[b as usize]));

        self.rank = vec![0; self.id_to_value.len()];
        for (position, &id) in self.sorted_ids.iter().enumerate() {
            self.rank[id as usize] = position as u32;
        }
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Running state for every supported aggregation over the sales measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Merges another accumulator into this one (for partial sums).
    pub fn merge(&mut self, other: &AggregateAccumulator) {
        if other.count == 0 {
            return;
        }
        self.sum += other.sum;
        self.count += other.count;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Computes the final value. An accumulator that never saw a record has
    /// no value, which is distinct from an observed zero.
    pub fn compute(&self, aggregation: AggregationType) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match aggregation {
            AggregationType::Sum => Some(self.sum),
            AggregationType::Count => Some(self.count as f64),
            AggregationType::Average => Some(self.sum / self.count as f64),
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
        }
    }
}

// ============================================================================
// MAIN CACHE STRUCT
// ============================================================================

/// Aggregates of one record set grouped by a list of dimensions, with every
/// margin combination materialized.
#[derive(Debug, Clone)]
pub struct CubeCache {
    /// Grouping dimensions, in key order.
    dimensions: Vec<Dimension>,

    /// One value store per grouping dimension.
    fields: Vec<DimensionCache>,

    /// Aggregates keyed by cube key (margins included).
    aggregates: FxHashMap<CubeKey, AggregateAccumulator>,

    record_count: usize,
}

impl CubeCache {
    /// Folds every record into the cache.
    ///
    /// A record with key (v1..vn) contributes to all 2^n keys obtained by
    /// replacing any subset of its members with `Member::Margin`. That is
    /// what makes every margin equal to the sum of the cells beneath it.
    pub fn build<'a, I>(records: I, dimensions: &[Dimension]) -> Self
    where
        I: IntoIterator<Item = &'a FactRecord>,
    {
        let mut fields: Vec<DimensionCache> =
            dimensions.iter().map(|&d| DimensionCache::new(d)).collect();
        let mut aggregates: FxHashMap<CubeKey, AggregateAccumulator> = FxHashMap::default();
        let mut record_count = 0;

        let n = dimensions.len();
        let combinations: u32 = 1 << n;

        for record in records {
            record_count += 1;

            let ids: CubeKey = fields
                .iter_mut()
                .map(|field| Member::Value(field.intern(record.value(field.dimension))))
                .collect();

            for mask in 0..combinations {
                let key: CubeKey = ids
                    .iter()
                    .enumerate()
                    .map(|(i, &member)| if mask & (1 << i) != 0 { Member::Margin } else { member })
                    .collect();
                aggregates.entry(key).or_default().add(record.sales);
            }
        }

        for field in fields.iter_mut() {
            field.rebuild_sort_order();
        }

        CubeCache {
            dimensions: dimensions.to_vec(),
            fields,
            aggregates,
            record_count,
        }
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of stored keys, margins included.
    pub fn aggregate_count(&self) -> usize {
        self.aggregates.len()
    }

    /// Position of a dimension in the key.
    pub fn position(&self, dimension: Dimension) -> Option<usize> {
        self.dimensions.iter().position(|&d| d == dimension)
    }

    pub fn field(&self, position: usize) -> Option<&DimensionCache> {
        self.fields.get(position)
    }

    pub fn get(&self, key: &[Member]) -> Option<&AggregateAccumulator> {
        self.aggregates.get(key)
    }

    /// Translates a dimension value into a member. Values never observed
    /// have no id and therefore no aggregate.
    pub fn resolve(&self, position: usize, value: &DimensionValue) -> Option<Member> {
        self.fields
            .get(position)
            .and_then(|f| f.lookup(value))
            .map(Member::Value)
    }

    /// Resolves a member back into its dimension value (None for margins).
    pub fn member_value(&self, position: usize, member: Member) -> Option<&DimensionValue> {
        match member {
            Member::Value(id) => self.fields.get(position).and_then(|f| f.get_value(id)),
            Member::Margin => None,
        }
    }

    /// Orders two keys member by member in natural order, margins last.
    pub fn compare_keys(&self, a: &[Member], b: &[Member]) -> Ordering {
        for ((field, &x), &y) in self.fields.iter().zip(a.iter()).zip(b.iter()) {
            let ord = field.compare_members(x, y);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    }

    /// All stored keys in natural order.
    pub fn sorted_keys(&self) -> Vec<&CubeKey> {
        let mut keys: Vec<&CubeKey> = self.aggregates.keys().collect();
        keys.sort_by(|a, b| self.compare_keys(a, b));
        keys
    }

    /// Observed combinations of the dimensions at `positions`, every other
    /// position held at the margin, in natural order.
    pub fn observed_paths(&self, positions: &[usize]) -> Vec<SmallVec<[ValueId; 5]>> {
        let mut paths: Vec<SmallVec<[ValueId; 5]>> = self
            .aggregates
            .keys()
            .filter(|key| {
                key.iter().enumerate().all(|(i, m)| {
                    if positions.contains(&i) {
                        !m.is_margin()
                    } else {
                        m.is_margin()
                    }
                })
            })
            .map(|key| {
                positions
                    .iter()
                    .filter_map(|&p| match key[p] {
                        Member::Value(id) => Some(id),
                        Member::Margin => None,
                    })
                    .collect()
            })
            .collect();

        paths.sort_by(|a, b| {
            for ((&p, &x), &y) in positions.iter().zip(a.iter()).zip(b.iter()) {
                let ord = self.fields[p].compare_members(Member::Value(x), Member::Value(y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_records() -> Vec<FactRecord> {
        vec![
            FactRecord::new(2025, 1, "B", "Sur", "X", 5.0),
            FactRecord::new(2024, 1, "A", "Norte", "X", 100.0),
            FactRecord::new(2024, 1, "A", "Norte", "Y", 50.0),
            FactRecord::new(2024, 2, "A", "Sur", "X", 30.0),
        ]
    }

    #[test]
    fn test_interning_and_sort_order() {
        let records = create_test_records();
        let cache = CubeCache::build(&records, &[Dimension::Year, Dimension::Region]);

        let years = cache.field(0).unwrap();
        assert_eq!(years.unique_count(), 2);
        // 2025 was seen first but sorts last.
        assert_eq!(
            years.sorted_values(),
            vec![&DimensionValue::Number(2024), &DimensionValue::Number(2025)]
        );
        assert_eq!(years.lookup(&DimensionValue::Number(2025)), Some(0));
        assert_eq!(years.lookup(&DimensionValue::Number(1999)), None);
    }

    #[test]
    fn test_every_margin_combination_is_stored() {
        let records = create_test_records();
        let cache = CubeCache::build(&records, &[Dimension::Year, Dimension::Region]);

        let y2024 = cache.resolve(0, &DimensionValue::Number(2024)).unwrap();
        let norte = cache.resolve(1, &DimensionValue::from("Norte")).unwrap();

        let cell = cache.get(&[y2024, norte]).unwrap();
        assert_eq!(cell.compute(AggregationType::Sum), Some(150.0));
        assert_eq!(cell.compute(AggregationType::Count), Some(2.0));

        let year_total = cache.get(&[y2024, Member::Margin]).unwrap();
        assert_eq!(year_total.compute(AggregationType::Sum), Some(180.0));

        let region_total = cache.get(&[Member::Margin, norte]).unwrap();
        assert_eq!(region_total.compute(AggregationType::Sum), Some(150.0));

        let grand = cache.get(&[Member::Margin, Member::Margin]).unwrap();
        assert_eq!(grand.compute(AggregationType::Sum), Some(185.0));
        assert_eq!(cache.record_count(), 4);
    }

    #[test]
    fn test_unobserved_combination_has_no_aggregate() {
        let records = create_test_records();
        let cache = CubeCache::build(&records, &[Dimension::Year, Dimension::Region]);
        let y2025 = cache.resolve(0, &DimensionValue::Number(2025)).unwrap();
        let norte = cache.resolve(1, &DimensionValue::from("Norte")).unwrap();
        assert!(cache.get(&[y2025, norte]).is_none());
    }

    #[test]
    fn test_observed_paths_are_sorted() {
        let records = create_test_records();
        let cache = CubeCache::build(&records, &[Dimension::Year, Dimension::Region]);
        let paths = cache.observed_paths(&[0, 1]);
        let labels: Vec<(String, String)> = paths
            .iter()
            .map(|p| {
                (
                    cache.member_value(0, Member::Value(p[0])).unwrap().to_string(),
                    cache.member_value(1, Member::Value(p[1])).unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                ("2024".to_string(), "Norte".to_string()),
                ("2024".to_string(), "Sur".to_string()),
                ("2025".to_string(), "Sur".to_string()),
            ]
        );
    }

    #[test]
    fn test_accumulator_merge_and_empty() {
        let mut a = AggregateAccumulator::new();
        assert_eq!(a.compute(AggregationType::Sum), None);
        a.add(4.0);
        a.add(2.0);
        let mut b = AggregateAccumulator::new();
        b.add(9.0);
        a.merge(&b);
        a.merge(&AggregateAccumulator::new());
        assert_eq!(a.compute(AggregationType::Sum), Some(15.0));
        assert_eq!(a.compute(AggregationType::Average), Some(5.0));
        assert_eq!(a.compute(AggregationType::Min), Some(2.0));
        assert_eq!(a.compute(AggregationType::Max), Some(9.0));
    }

    #[test]
    fn test_observed_zero_is_a_value() {
        let records = vec![FactRecord::new(2024, 1, "A", "Norte", "X", 0.0)];
        let cache = CubeCache::build(&records, &[Dimension::Product]);
        let a = cache.resolve(0, &DimensionValue::from("A")).unwrap();
        assert_eq!(cache.get(&[a]).unwrap().compute(AggregationType::Sum), Some(0.0));
    }
}
