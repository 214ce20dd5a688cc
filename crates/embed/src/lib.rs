//! SemStore embedding backends
//!
//! The `Embedder` trait is the boundary between the store and whatever model
//! turns text into vectors.

mod embedder;
mod hashing;
#[cfg(feature = "ollama")]
mod ollama;
mod types;

pub use embedder::{stack_rows, validate_text, Embedder};
pub use hashing::HashingEmbedder;
#[cfg(feature = "ollama")]
pub use ollama::OllamaEmbedder;
pub use types::{EmbedRequest, EmbedResponse};

use semstore_common::{AppConfig, EmbedderKind, Result};
use std::sync::Arc;

/// Build the embedder selected by the configuration
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedder {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(config.hashing_dimension)?)),
        #[cfg(feature = "ollama")]
        EmbedderKind::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            config.ollama_base_url.clone(),
            config.embedding_model.clone(),
        )?)),
        #[cfg(not(feature = "ollama"))]
        EmbedderKind::Ollama => Err(semstore_common::SemStoreError::config(
            "Built without the `ollama` feature; use SEMSTORE_EMBEDDER=hashing",
        )),
    }
}
