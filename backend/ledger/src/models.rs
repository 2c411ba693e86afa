//! # Sales Records
//!
//! One document per simulated transaction, stored in the `sales_data` collection.
//!
//! ## Schema
//! - timestamp (**string**, RFC 3339, UTC, microsecond precision)
//! - region (**string**, one of [`REGIONS`])
//! - product (**string**, one of [`PRODUCTS`])
//! - sales_amount (**float**, non-negative)
//! - quantity_sold (**int**, 1..=5 for generated records)
//! - inventory (**int**, optional, only present on imported rows)
//!
//! Timestamps are always written with [`format_timestamp`] so that comparing the
//! strings compares the instants. Time filters in the store rely on this.
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

pub const REGIONS: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "Widget-A")]
    WidgetA,
    #[serde(rename = "Gadget-B")]
    GadgetB,
    #[serde(rename = "Device-C")]
    DeviceC,
    #[serde(rename = "Tool-D")]
    ToolD,
}

pub const PRODUCTS: [Product; 4] = [
    Product::WidgetA,
    Product::GadgetB,
    Product::DeviceC,
    Product::ToolD,
];

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::WidgetA => "Widget-A",
            Product::GadgetB => "Gadget-B",
            Product::DeviceC => "Device-C",
            Product::ToolD => "Tool-D",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub timestamp: String,
    pub region: Region,
    pub product: Product,
    pub sales_amount: f64,
    pub quantity_sold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<u32>,
}

impl SalesRecord {
    /// Calendar date of the record in UTC.
    ///
    /// Accepts full RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates.
    pub fn date(&self) -> Option<NaiveDate> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(instant.with_timezone(&Utc).date_naive());
        }

        NaiveDate::parse_from_str(&self.timestamp, "%Y-%m-%d").ok()
    }

    pub fn quarter(&self) -> Option<Quarter> {
        self.date().map(Quarter::from_date)
    }
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Rounds to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calendar quarter, ordered chronologically and displayed as `2025Q3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub number: u32,
}

impl Quarter {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            number: date.month0() / 3 + 1,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.number)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn record(timestamp: &str) -> SalesRecord {
        SalesRecord {
            timestamp: timestamp.to_string(),
            region: Region::North,
            product: Product::WidgetA,
            sales_amount: 10.0,
            quantity_sold: 1,
            inventory: None,
        }
    }

    #[test]
    fn test_wire_names() {
        let value = serde_json::to_value(SalesRecord {
            product: Product::GadgetB,
            region: Region::West,
            ..record("2025-01-01T00:00:00.000000+00:00")
        })
        .unwrap();

        assert_eq!(value["product"], "Gadget-B");
        assert_eq!(value["region"], "West");
        assert!(value.get("inventory").is_none());
    }

    #[test]
    fn test_inventory_is_optional() {
        let parsed: SalesRecord = serde_json::from_value(json!({
            "timestamp": "2025-02-01",
            "region": "East",
            "product": "Tool-D",
            "sales_amount": 120.5,
            "quantity_sold": 2,
            "inventory": 4
        }))
        .unwrap();

        assert_eq!(parsed.inventory, Some(4));
        assert_eq!(parsed.product, Product::ToolD);
    }

    #[test]
    fn test_date_from_timestamp() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

        assert_eq!(record("2025-03-31T23:59:59.000001+00:00").date(), Some(date));
        assert_eq!(record("2025-04-01T01:00:00+02:00").date(), Some(date));
        assert_eq!(record("2025-03-31").date(), Some(date));
        assert_eq!(record("yesterday").date(), None);
    }

    #[test]
    fn test_quarter_labels() {
        assert_eq!(record("2025-01-15").quarter().unwrap().to_string(), "2025Q1");
        assert_eq!(record("2025-06-30").quarter().unwrap().to_string(), "2025Q2");
        assert_eq!(record("2024-12-01").quarter().unwrap().to_string(), "2024Q4");
        assert!(
            record("2024-12-01").quarter().unwrap() < record("2025-01-01").quarter().unwrap()
        );
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        let early = format_timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
        let late = format_timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());

        assert_eq!(early, "2025-01-01T09:00:00.000000+00:00");
        assert!(early < late);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(123.456), 123.46);
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(100.0), 100.0);
        assert_eq!(round2(0.004), 0.0);
    }
}
