use crate::config::AppConfig;
use crate::store::{DocumentStore, DynamoStore, MemoryStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(DynamoStore::new(&config.store).await?) as Arc<dyn DocumentStore>;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    pub fn from_parts(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// In-memory store with both collections provisioned and test JWT settings.
    pub fn fake() -> Self {
        let store = Arc::new(MemoryStore::provisioned()) as Arc<dyn DocumentStore>;
        Self {
            store,
            config: Arc::new(AppConfig::fake()),
        }
    }
}
