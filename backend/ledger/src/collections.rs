//! Typed access to the three persisted collections.
use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde_json::Value;
use tracing::warn;

use crate::{
    models::{SalesRecord, format_timestamp},
    store::{DocumentStore, GroupSum, StoreError},
};

pub const SALES_COLLECTION: &str = "sales_data";
pub const FEEDBACK_COLLECTION: &str = "feedback";
pub const AI_LOG_COLLECTION: &str = "ai_logs";

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const DESCRIPTION_FIELD: &str = "description";

pub async fn insert_sales(
    store: &dyn DocumentStore,
    records: &[SalesRecord],
) -> Result<(), StoreError> {
    let documents = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    store.insert(SALES_COLLECTION, &documents).await
}

pub async fn all_sales(store: &dyn DocumentStore) -> Result<Vec<SalesRecord>, StoreError> {
    let documents = store.find_all(SALES_COLLECTION).await?;

    Ok(decode_sales(documents))
}

pub async fn sales_since(
    store: &dyn DocumentStore,
    since: DateTime<Utc>,
) -> Result<Vec<SalesRecord>, StoreError> {
    let documents = store
        .find_since(SALES_COLLECTION, TIMESTAMP_FIELD, &format_timestamp(since))
        .await?;

    Ok(decode_sales(documents))
}

/// Sales totals per region and product.
pub async fn sales_summary(store: &dyn DocumentStore) -> Result<Vec<GroupSum>, StoreError> {
    store
        .sum_by(SALES_COLLECTION, &["region", "product"], "sales_amount")
        .await
}

pub async fn store_feedback(store: &dyn DocumentStore, feedback: Value) -> Result<(), StoreError> {
    store.insert(FEEDBACK_COLLECTION, &[feedback]).await
}

pub async fn store_ai_log(store: &dyn DocumentStore, log: Value) -> Result<(), StoreError> {
    store.insert(AI_LOG_COLLECTION, &[log]).await
}

/// Descriptions matching `query` case-insensitively, one per line.
pub async fn fetch_relevant_data(
    store: &dyn DocumentStore,
    query: &str,
) -> Result<String, StoreError> {
    let pattern = RegexBuilder::new(query).case_insensitive(true).build()?;
    let matches = store
        .search(SALES_COLLECTION, DESCRIPTION_FIELD, &pattern)
        .await?;

    Ok(matches.join("\n"))
}

fn decode_sales(documents: Vec<Value>) -> Vec<SalesRecord> {
    documents
        .into_iter()
        .filter_map(|document| {
            serde_json::from_value(document)
                .map_err(|e| warn!("Skipping malformed sales document: {e}"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::{
        memory::MemoryStore,
        models::{Product, Region},
    };

    fn record_at(instant: DateTime<Utc>, region: Region, amount: f64) -> SalesRecord {
        SalesRecord {
            timestamp: format_timestamp(instant),
            region,
            product: Product::DeviceC,
            sales_amount: amount,
            quantity_sold: 3,
            inventory: None,
        }
    }

    #[tokio::test]
    async fn test_sales_since_filters_by_instant() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();

        let old = record_at(now - Duration::hours(30), Region::North, 100.0);
        let fresh = record_at(now - Duration::hours(2), Region::South, 200.0);
        insert_sales(&store, &[old.clone(), fresh.clone()]).await.unwrap();

        let recent = sales_since(&store, now - Duration::hours(24)).await.unwrap();
        assert_eq!(recent, vec![fresh]);

        let everything = all_sales(&store).await.unwrap();
        assert_eq!(everything.len(), 2);
        assert_eq!(everything[0], old);
    }

    #[tokio::test]
    async fn test_malformed_sales_are_skipped() {
        let store = MemoryStore::new();
        store
            .insert(SALES_COLLECTION, &[json!({"quarter": "Q1", "region": "North", "sales": 25000})])
            .await
            .unwrap();

        assert!(all_sales(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_by_region_and_product() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();
        insert_sales(
            &store,
            &[
                record_at(now, Region::West, 10.25),
                record_at(now, Region::West, 4.75),
                record_at(now, Region::East, 1.0),
            ],
        )
        .await
        .unwrap();

        let summary = sales_summary(&store).await.unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].key["region"], "East");
        assert_eq!(summary[1].key["region"], "West");
        assert_eq!(summary[1].key["product"], "Device-C");
        assert_eq!(summary[1].total, 15.0);
    }

    #[tokio::test]
    async fn test_feedback_and_logs_are_kept_as_is() {
        let store = MemoryStore::new();
        store_feedback(&store, json!({"x": 1})).await.unwrap();
        store_ai_log(&store, json!({"prompt": "hi", "tokens": [1, 2]})).await.unwrap();

        assert_eq!(store.find_all(FEEDBACK_COLLECTION).await.unwrap(), vec![json!({"x": 1})]);
        assert_eq!(
            store.find_all(AI_LOG_COLLECTION).await.unwrap(),
            vec![json!({"prompt": "hi", "tokens": [1, 2]})]
        );
    }

    #[tokio::test]
    async fn test_relevant_data_joined_by_newline() {
        let store = MemoryStore::new();
        store
            .insert(
                SALES_COLLECTION,
                &[
                    json!({"description": "Widget promo North"}),
                    json!({"description": "Gadget restock"}),
                    json!({"description": "widget bundle"}),
                ],
            )
            .await
            .unwrap();

        let data = fetch_relevant_data(&store, "WIDGET").await.unwrap();
        assert_eq!(data, "Widget promo North\nwidget bundle");

        assert!(matches!(
            fetch_relevant_data(&store, "(unclosed").await,
            Err(StoreError::InvalidPattern(_))
        ));
    }
}
