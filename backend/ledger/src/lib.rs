//! # Ledger
//!
//! Sales data model and document storage shared by the simulator and the server.
//!
//! ## Backends
//! - `redis://...`: [`RedisStore`], shared between processes
//! - `memory://`: [`MemoryStore`], process local, handy for demos and tests
//!
//! Both are reached through the [`DocumentStore`] trait. Whoever calls
//! [`connect`] owns the handle and the connection goes away with it.
use std::sync::Arc;

use tracing::info;

pub mod collections;
pub mod memory;
pub mod models;
pub mod remote;
pub mod store;

pub use memory::MemoryStore;
pub use remote::RedisStore;
pub use store::{DocumentStore, GroupSum, StoreError};

pub const MEMORY_URL: &str = "memory://";

pub async fn connect(database_url: &str, db_name: &str) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = if database_url.starts_with(MEMORY_URL) {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(RedisStore::connect(database_url, db_name).await?)
    };

    store.ping().await?;
    info!(backend = store.backend_name(), db_name, "Document store ready");

    Ok(store)
}
