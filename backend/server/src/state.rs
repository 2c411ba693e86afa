use std::sync::Arc;

use ledger::{DocumentStore, StoreError};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{config::Config, notify::Notifier};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub notifier: Notifier,
    /// Every feedback payload received since startup, in arrival order
    pub feedback_log: Mutex<Vec<Value>>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let store = ledger::connect(&config.database_url, &config.db_name).await?;

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Arc<Self> {
        let notifier = Notifier::new(config.event_capacity);

        Arc::new(Self {
            config,
            store,
            notifier,
            feedback_log: Mutex::new(Vec::new()),
        })
    }
}
