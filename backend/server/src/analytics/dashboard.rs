use std::collections::BTreeMap;

use ledger::models::{SalesRecord, round2};
use serde::Serialize;

use super::sum_by;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub date: String,
    pub sales: f64,
}

/// Product rows, region columns.
pub type Heatmap = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub line: Vec<LinePoint>,
    pub heatmap: Heatmap,
    pub pie: BTreeMap<String, f64>,
}

pub fn dashboard(records: &[SalesRecord]) -> DashboardView {
    let line = sum_by(records, SalesRecord::date)
        .into_iter()
        .map(|(date, sales)| LinePoint {
            date: date.to_string(),
            sales,
        })
        .collect();

    let pie = sum_by(records, |record| Some(record.region.as_str()))
        .into_iter()
        .map(|(region, sales)| (region.to_string(), round2(sales)))
        .collect();

    DashboardView {
        line,
        heatmap: heatmap(records),
        pie,
    }
}

/// Every product seen gets a cell for every region seen, zero when they never met.
fn heatmap(records: &[SalesRecord]) -> Heatmap {
    let cells = sum_by(records, |record| {
        Some((record.product.as_str(), record.region.as_str()))
    });

    let regions: Vec<&str> = {
        let mut regions: Vec<&str> = cells.keys().map(|(_, region)| *region).collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    };

    let mut heatmap = Heatmap::new();
    for (product, _) in cells.keys() {
        heatmap.entry(product.to_string()).or_insert_with(|| {
            regions
                .iter()
                .map(|region| {
                    let sales = cells.get(&(*product, *region)).copied().unwrap_or(0.0);
                    (region.to_string(), round2(sales))
                })
                .collect()
        });
    }

    heatmap
}
