use ledger::models::SalesRecord;
use serde::Serialize;

use super::{ALERT_THRESHOLD, growth, quarterly_totals};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterGrowth {
    pub quarter: String,
    pub sales: f64,
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub quarterly_growth: Vec<QuarterGrowth>,
    pub alerts: Vec<String>,
}

pub fn trends(records: &[SalesRecord]) -> TrendReport {
    let mut quarterly_growth = Vec::new();
    let mut previous: Option<f64> = None;

    for (quarter, sales) in quarterly_totals(records) {
        quarterly_growth.push(QuarterGrowth {
            quarter: quarter.to_string(),
            sales,
            growth: previous.map_or(0.0, |previous| growth(previous, sales)),
        });
        previous = Some(sales);
    }

    let alerts = quarterly_growth
        .iter()
        .filter_map(|row| growth_alert(&row.quarter, row.growth))
        .collect();

    TrendReport {
        quarterly_growth,
        alerts,
    }
}

pub fn growth_alert(quarter: &str, growth: f64) -> Option<String> {
    if growth < -ALERT_THRESHOLD {
        Some(format!(
            "Alert: Sales dropped by {:.1}% in {quarter}",
            growth.abs() * 100.0
        ))
    } else if growth > ALERT_THRESHOLD {
        Some(format!(
            "Growth: Sales increased by {:.1}% in {quarter}",
            growth * 100.0
        ))
    } else {
        None
    }
}
