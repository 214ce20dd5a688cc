use semstore_common::{AppConfig, Result};
use semstore_vector::SemanticStore;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// The document store served by this process
    pub store: Arc<SemanticStore>,
}

impl AppState {
    /// Create new application state with the configured embedder
    pub fn new(config: AppConfig) -> Result<Self> {
        let embedder = semstore_embed::from_config(&config)?;
        Ok(Self::with_store(config, Arc::new(SemanticStore::new(embedder))))
    }

    /// Wrap an existing store
    pub fn with_store(config: AppConfig, store: Arc<SemanticStore>) -> Self {
        Self { config, store }
    }
}
