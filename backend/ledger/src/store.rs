//! # Document Store
//!
//! Thin CRUD layer over named collections of JSON documents.
//!
//! Backends only need to append and scan. Filtering, grouping and text search
//! are built on top of [`DocumentStore::find_all`] so every backend answers
//! them the same way.
//!
//! ## Identifiers
//! - Every inserted document gets a numeric `_id` assigned by the backend
//! - `_id` is stripped from everything handed back to callers
use std::collections::BTreeMap;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const ID_FIELD: &str = "_id";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document is not a JSON object")]
    NotAnObject,

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Total of one group produced by [`DocumentStore::sum_by`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSum {
    pub key: BTreeMap<String, Value>,
    pub total: f64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logging
    fn backend_name(&self) -> &'static str;

    /// Round trip to the backend, used to fail fast at startup
    async fn ping(&self) -> Result<(), StoreError>;

    /// Append one or many documents, assigning each an `_id`
    async fn insert(&self, collection: &str, documents: &[Value]) -> Result<(), StoreError>;

    /// Every document in insertion order, `_id` stripped
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Documents whose string `field` compares greater than or equal to `since`
    async fn find_since(
        &self,
        collection: &str,
        field: &str,
        since: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let documents = self.find_all(collection).await?;

        Ok(documents
            .into_iter()
            .filter(|document| {
                document
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|value| value >= since)
            })
            .collect())
    }

    /// Sum `value_field` grouped by the composite key made of `keys`.
    ///
    /// Missing key fields group under `null`, non-numeric values add nothing.
    /// Groups come back ordered by their serialized key.
    async fn sum_by(
        &self,
        collection: &str,
        keys: &[&str],
        value_field: &str,
    ) -> Result<Vec<GroupSum>, StoreError> {
        let documents = self.find_all(collection).await?;
        let mut groups: BTreeMap<String, GroupSum> = BTreeMap::new();

        for document in documents {
            let key: BTreeMap<String, Value> = keys
                .iter()
                .map(|field| {
                    let value = document.get(*field).cloned().unwrap_or(Value::Null);
                    (field.to_string(), value)
                })
                .collect();

            let amount = document
                .get(value_field)
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            groups
                .entry(serde_json::to_string(&key)?)
                .or_insert_with(|| GroupSum { key, total: 0.0 })
                .total += amount;
        }

        Ok(groups.into_values().collect())
    }

    /// Values of the string `field` in every document matching `pattern`
    async fn search(
        &self,
        collection: &str,
        field: &str,
        pattern: &Regex,
    ) -> Result<Vec<String>, StoreError> {
        let documents = self.find_all(collection).await?;

        Ok(documents
            .iter()
            .filter_map(|document| document.get(field).and_then(Value::as_str))
            .filter(|text| pattern.is_match(text))
            .map(str::to_string)
            .collect())
    }
}

pub(crate) fn tag_document(document: &Value, id: u64) -> Result<Value, StoreError> {
    let Value::Object(fields) = document else {
        return Err(StoreError::NotAnObject);
    };

    let mut tagged = Map::with_capacity(fields.len() + 1);
    tagged.insert(ID_FIELD.to_string(), Value::from(id));
    tagged.extend(
        fields
            .iter()
            .filter(|(name, _)| name.as_str() != ID_FIELD)
            .map(|(name, value)| (name.clone(), value.clone())),
    );

    Ok(Value::Object(tagged))
}

pub(crate) fn strip_id(mut document: Value) -> Value {
    if let Value::Object(fields) = &mut document {
        fields.remove(ID_FIELD);
    }

    document
}
