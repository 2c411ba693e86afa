//! In-process backend selected with `memory://`.
//!
//! Nothing is shared between processes, so the simulator and the server only
//! see each other's writes through Redis.
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{DocumentStore, StoreError, strip_id, tag_document};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, collection: &str, documents: &[Value]) -> Result<(), StoreError> {
        let tagged = documents
            .iter()
            .map(|document| tag_document(document, self.next_id.fetch_add(1, Ordering::Relaxed) + 1))
            .collect::<Result<Vec<_>, _>>()?;

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(tagged);

        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|documents| documents.iter().cloned().map(strip_id).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use regex::RegexBuilder;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_insert_and_scan() {
        let store = MemoryStore::new();
        store
            .insert("feedback", &[json!({"x": 1}), json!({"x": 2})])
            .await
            .unwrap();

        let documents = store.find_all("feedback").await.unwrap();
        assert_eq!(documents, vec![json!({"x": 1}), json!({"x": 2})]);
        assert!(store.find_all("ai_logs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_is_all_or_nothing() {
        let store = MemoryStore::new();

        assert!(store.insert("feedback", &[json!({"x": 1}), json!(3)]).await.is_err());
        assert!(store.find_all("feedback").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_since_compares_strings() {
        let store = MemoryStore::new();
        store
            .insert(
                "sales_data",
                &[
                    json!({"timestamp": "2025-01-01T09:00:00.000000+00:00"}),
                    json!({"timestamp": "2025-01-01T10:00:00.000000+00:00"}),
                    json!({"other": true}),
                ],
            )
            .await
            .unwrap();

        let recent = store
            .find_since("sales_data", "timestamp", "2025-01-01T10:00:00.000000+00:00")
            .await
            .unwrap();

        assert_eq!(recent, vec![json!({"timestamp": "2025-01-01T10:00:00.000000+00:00"})]);
    }

    #[tokio::test]
    async fn test_sum_by_composite_key() {
        let store = MemoryStore::new();
        store
            .insert(
                "sales",
                &[
                    json!({"quarter": "Q1", "region": "North", "sales": 25000}),
                    json!({"quarter": "Q1", "region": "North", "sales": 500.5}),
                    json!({"quarter": "Q1", "region": "South", "sales": 20000}),
                    json!({"quarter": "Q2", "region": "North", "sales": "n/a"}),
                ],
            )
            .await
            .unwrap();

        let groups = store
            .sum_by("sales", &["quarter", "region"], "sales")
            .await
            .unwrap();

        let totals: Vec<(Value, Value, f64)> = groups
            .into_iter()
            .map(|group| (group.key["quarter"].clone(), group.key["region"].clone(), group.total))
            .collect();

        assert_eq!(
            totals,
            vec![
                (json!("Q1"), json!("North"), 25500.5),
                (json!("Q1"), json!("South"), 20000.0),
                (json!("Q2"), json!("North"), 0.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .insert(
                "sales_data",
                &[
                    json!({"description": "Holiday promo in the North"}),
                    json!({"description": "Clearance"}),
                    json!({"description": 42}),
                ],
            )
            .await
            .unwrap();

        let pattern = RegexBuilder::new("north").case_insensitive(true).build().unwrap();
        let matches = store.search("sales_data", "description", &pattern).await.unwrap();

        assert_eq!(matches, vec!["Holiday promo in the North".to_string()]);
    }
}
