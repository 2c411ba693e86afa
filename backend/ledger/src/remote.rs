//! # Redis
//!
//! Shared backend between the simulator and the server.
//!
//! ## Layout
//! - One list per collection: `{db}:{collection}`, each entry a JSON document
//! - One counter per collection: `{db}:{collection}:seq`, source of `_id`
//! - Inserting many documents reserves a block of ids with a single `INCRBY`
//! - Scans are `LRANGE 0 -1`, every view reads the whole collection
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde_json::Value;

use crate::store::{DocumentStore, StoreError, strip_id, tag_document};

pub struct RedisStore {
    connection: ConnectionManager,
    namespace: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, namespace: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client = Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            connection,
            namespace: namespace.to_string(),
        })
    }
}

fn collection_key(namespace: &str, collection: &str) -> String {
    format!("{namespace}:{collection}")
}

fn sequence_key(namespace: &str, collection: &str) -> String {
    format!("{namespace}:{collection}:seq")
}

/// First id of a block of `count` ids ending at `last_id`, as reserved by `INCRBY`.
fn first_id(last_id: u64, count: u64) -> u64 {
    (last_id + 1).saturating_sub(count)
}

#[async_trait]
impl DocumentStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn insert(&self, collection: &str, documents: &[Value]) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut connection = self.connection.clone();
        let count = documents.len() as u64;

        let last_id: u64 = connection
            .incr(sequence_key(&self.namespace, collection), count)
            .await?;

        let payloads = documents
            .iter()
            .zip(first_id(last_id, count)..)
            .map(|(document, id)| {
                let tagged = tag_document(document, id)?;
                Ok(serde_json::to_string(&tagged)?)
            })
            .collect::<Result<Vec<String>, StoreError>>()?;

        let _: () = connection
            .rpush(collection_key(&self.namespace, collection), payloads)
            .await?;

        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let mut connection = self.connection.clone();

        let entries: Vec<String> = connection
            .lrange(collection_key(&self.namespace, collection), 0, -1)
            .await?;

        entries
            .iter()
            .map(|entry| Ok(strip_id(serde_json::from_str(entry)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced_per_collection() {
        assert_eq!(collection_key("bizpulse", "sales_data"), "bizpulse:sales_data");
        assert_eq!(sequence_key("bizpulse", "sales_data"), "bizpulse:sales_data:seq");
        assert_ne!(collection_key("demo", "feedback"), collection_key("bizpulse", "feedback"));
    }

    #[test]
    fn test_first_id_of_reserved_block() {
        // fresh counter, INCRBY 3 returns 3, ids 1..=3
        assert_eq!(first_id(3, 3), 1);
        // counter at 10, INCRBY 1 returns 11
        assert_eq!(first_id(11, 1), 11);
        // counter at 5, INCRBY 4 returns 9, ids 6..=9
        let ids: Vec<u64> = (first_id(9, 4)..=9).collect();
        assert_eq!(ids, vec![6, 7, 8, 9]);
    }
}
