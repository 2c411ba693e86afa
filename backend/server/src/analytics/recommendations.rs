use std::collections::BTreeMap;

use ledger::models::SalesRecord;

use super::{ALERT_THRESHOLD, growth, sum_by};

pub const LOW_INVENTORY: u32 = 10;
pub const HIGH_DEMAND_AMOUNT: f64 = 100.0;

pub fn recommendations(records: &[SalesRecord]) -> Vec<String> {
    let mut recommendations: Vec<String> = records
        .iter()
        .filter(|record| {
            record
                .inventory
                .is_some_and(|inventory| inventory < LOW_INVENTORY)
                && record.sales_amount > HIGH_DEMAND_AMOUNT
        })
        .map(|record| {
            format!(
                "Inventory is low for {}, but demand is increasing.",
                record.product
            )
        })
        .collect();

    recommendations.extend(regional_drops(records));

    recommendations
}

/// Compares the two latest quarters present in the data, whether or not they
/// are adjacent on the calendar. A region has to appear in both to be judged.
fn regional_drops(records: &[SalesRecord]) -> Vec<String> {
    let totals = sum_by(records, |record| {
        record.quarter().map(|quarter| (quarter, record.region.as_str()))
    });

    let mut by_quarter: BTreeMap<_, BTreeMap<&str, f64>> = BTreeMap::new();
    for ((quarter, region), sales) in totals {
        by_quarter.entry(quarter).or_default().insert(region, sales);
    }

    let mut latest = by_quarter.values().rev();
    let (Some(last), Some(previous)) = (latest.next(), latest.next()) else {
        return Vec::new();
    };

    previous
        .iter()
        .filter(|(_, previous_sales)| **previous_sales > 0.0)
        .filter_map(|(region, previous_sales)| {
            let change = growth(*previous_sales, *last.get(region)?);

            (change < -ALERT_THRESHOLD).then(|| {
                format!(
                    "Sales dropped in {region} by {:.1}% compared to last quarter. Consider promotion.",
                    change.abs() * 100.0
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ledger::models::{Product, Region};

    use super::*;
    use crate::analytics::fixtures::sale;

    fn stocked(date: &str, product: Product, amount: f64, inventory: u32) -> SalesRecord {
        SalesRecord {
            inventory: Some(inventory),
            ..sale(date, Region::North, product, amount)
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(recommendations(&[]).is_empty());
    }

    #[test]
    fn test_low_stock_high_demand() {
        let records = [
            stocked("2025-01-01", Product::GadgetB, 150.0, 3),
            stocked("2025-01-01", Product::WidgetA, 150.0, 10),
            stocked("2025-01-01", Product::ToolD, 100.0, 2),
            sale("2025-01-01", Region::North, Product::DeviceC, 900.0),
        ];

        assert_eq!(
            recommendations(&records),
            vec!["Inventory is low for Gadget-B, but demand is increasing.".to_string()]
        );
    }

    #[test]
    fn test_regional_drop_between_last_two_quarters() {
        let records = [
            sale("2024-10-01", Region::North, Product::WidgetA, 50.0),
            sale("2025-01-10", Region::North, Product::WidgetA, 200.0),
            sale("2025-01-10", Region::South, Product::WidgetA, 100.0),
            sale("2025-01-10", Region::East, Product::WidgetA, 100.0),
            sale("2025-04-10", Region::North, Product::WidgetA, 150.0),
            sale("2025-04-10", Region::South, Product::WidgetA, 91.0),
            sale("2025-04-10", Region::West, Product::WidgetA, 10.0),
        ];

        assert_eq!(
            recommendations(&records),
            vec![
                "Sales dropped in North by 25.0% compared to last quarter. Consider promotion."
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_single_quarter_has_nothing_to_compare() {
        let records = [
            sale("2025-01-10", Region::North, Product::WidgetA, 200.0),
            sale("2025-02-10", Region::North, Product::WidgetA, 10.0),
        ];

        assert!(recommendations(&records).is_empty());
    }

    #[test]
    fn test_sparse_quarters_compare_latest_groups() {
        // 2024Q1 and 2025Q3 are far apart but are still the two latest groups
        let records = [
            sale("2025-08-01", Region::East, Product::ToolD, 40.0),
            sale("2024-02-01", Region::East, Product::ToolD, 100.0),
            sale("2023-05-01", Region::East, Product::ToolD, 1.0),
        ];

        assert_eq!(
            recommendations(&records),
            vec![
                "Sales dropped in East by 60.0% compared to last quarter. Consider promotion."
                    .to_string()
            ]
        );
    }
}
