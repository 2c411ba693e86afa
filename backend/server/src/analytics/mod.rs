//! # Analytics
//!
//! Pure functions turning the current set of sales into chart-ready shapes.
//!
//! Nothing is cached or persisted. Every request reads the whole `sales_data`
//! collection and recomputes, so an unchanged store always yields the same views.
//!
//! - [`dashboard`]: line, heatmap and pie views
//! - [`trends`]: quarter over quarter growth with alerts
//! - [`cards`]: top product, weakest region, one week forecast
//! - [`recommendations`]: low stock and regional drop warnings
//!
//! Records whose timestamp cannot be read as a date are left out of every
//! date or quarter based grouping.
use std::collections::BTreeMap;

use ledger::models::{Quarter, SalesRecord};

pub mod cards;
pub mod dashboard;
pub mod recommendations;
pub mod trends;

/// Views report growth beyond this fraction in either direction.
pub const ALERT_THRESHOLD: f64 = 0.1;

/// Fractional change from `previous` to `current`, zero when there is nothing to compare against.
pub fn growth(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }

    (current - previous) / previous
}

/// Sum of `sales_amount` per label, ordered by label.
pub fn sum_by<K, F>(records: &[SalesRecord], label: F) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&SalesRecord) -> Option<K>,
{
    let mut totals = BTreeMap::new();

    for record in records {
        if let Some(key) = label(record) {
            *totals.entry(key).or_insert(0.0) += record.sales_amount;
        }
    }

    totals
}

pub fn quarterly_totals(records: &[SalesRecord]) -> BTreeMap<Quarter, f64> {
    sum_by(records, SalesRecord::quarter)
}
