//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the cube-engine integration tests.

#![allow(dead_code)]

use facts::{FactRecord, FactTable};

pub const YEARS: [i32; 3] = [2023, 2024, 2025];
pub const PRODUCTS: [&str; 3] = ["A", "B", "C"];
pub const REGIONS: [&str; 4] = ["Este", "Norte", "Oeste", "Sur"];
pub const CHANNELS: [&str; 2] = ["Online", "Tienda"];

/// The three-record table used in the worked example.
pub fn scenario_table() -> FactTable {
    FactTable::new(vec![
        FactRecord::new(2024, 1, "A", "Norte", "X", 100.0),
        FactRecord::new(2024, 1, "A", "Norte", "Y", 50.0),
        FactRecord::new(2024, 2, "A", "Sur", "X", 30.0),
    ])
}

/// A dense, deterministic table: every combination present, with whole
/// number sales so sums compare exactly.
pub fn dense_table() -> FactTable {
    let mut records = Vec::new();
    let mut n = 0u32;
    for &year in &YEARS {
        for quarter in 1..=4u8 {
            for product in PRODUCTS {
                for region in REGIONS {
                    for channel in CHANNELS {
                        n += 1;
                        // Skip a few combinations so some cells are unobserved.
                        if n % 7 == 0 {
                            continue;
                        }
                        let sales = f64::from((n * 37) % 500);
                        records.push(FactRecord::new(year, quarter, product, region, channel, sales));
                    }
                }
            }
        }
    }
    FactTable::new(records)
}

/// Float comparison for sums accumulated in different orders.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}
