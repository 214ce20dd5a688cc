use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use ndarray::Array2;
use reqwest::Client;
use semstore_common::{Result, SemStoreError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::embedder::{stack_rows, validate_text, Embedder};
use crate::types::{EmbedRequest, EmbedResponse};

/// Parallel requests issued by `embed_many`
const MAX_IN_FLIGHT: usize = 4;

/// Attempts per embedding request
const MAX_RETRIES: u32 = 3;

/// Outcome of a failed request attempt
enum Attempt {
    Transient(SemStoreError),
    Fatal(SemStoreError),
}

/// Ollama embedding client
///
/// Every add re-embeds the whole corpus, so vectors are cached by a hash of
/// `(model, text)` and only new texts reach the server.
#[derive(Debug)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: Client,
    dimension: OnceLock<usize>,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl OllamaEmbedder {
    /// Create new Ollama embedder
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| SemStoreError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama embedder initialized: {} (model={})", base_url, model);
        Ok(Self {
            base_url,
            model,
            client,
            dimension: OnceLock::new(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Test connection to Ollama
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            SemStoreError::network(format!("Failed to connect to Ollama: {}", e))
        })?;
        Ok(response.status().is_success())
    }

    /// Number of cached vectors
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Drop all cached vectors
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    fn cache_key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generate embedding with retry logic
    ///
    /// Only transport failures and 5xx responses are retried; a 4xx such as
    /// an unknown model fails on the first attempt.
    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        debug!("Generating embedding - Model: {}, Text length: {}", self.model, text.len());

        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.try_embed(&url, &request).await {
                Ok(embedding) => {
                    debug!("Received embedding - Dimension: {}", embedding.len());
                    return Ok(embedding);
                }
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Transient(e)) => {
                    if attempt < MAX_RETRIES {
                        let delay = std::time::Duration::from_secs(2u64.pow(attempt - 1));
                        warn!(
                            "Embedding request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, MAX_RETRIES, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SemStoreError::embedding("All retries failed")))
    }

    /// Single attempt to generate embedding
    async fn try_embed(
        &self,
        url: &str,
        request: &EmbedRequest,
    ) -> std::result::Result<Vec<f32>, Attempt> {
        let response = self.client.post(url).json(request).send().await.map_err(|e| {
            Attempt::Transient(SemStoreError::embedding(format!(
                "Failed to send embedding request: {}",
                e
            )))
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = SemStoreError::embedding(format!(
                "Ollama embedding API error: {} (model={})",
                status, self.model
            ));
            return Err(if status.is_server_error() {
                Attempt::Transient(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        let result: EmbedResponse = response.json().await.map_err(|e| {
            Attempt::Fatal(SemStoreError::embedding(format!(
                "Failed to parse embedding response: {}",
                e
            )))
        })?;

        if result.embedding.is_empty() {
            return Err(Attempt::Fatal(SemStoreError::embedding(
                "Empty embedding from Ollama",
            )));
        }

        Ok(result.embedding)
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        let expected = *self.dimension.get_or_init(|| embedding.len());
        if embedding.len() != expected {
            return Err(SemStoreError::embedding(format!(
                "Model {} returned {} dimensions, expected {}",
                self.model,
                embedding.len(),
                expected
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    async fn health_check(&self) -> Result<bool> {
        self.test_connection().await
    }

    async fn reset(&self) {
        let dropped = self.cached().await;
        self.clear_cache().await;
        debug!("Embedding cache cleared - {} vectors dropped", dropped);
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;

        let key = self.cache_key(text);
        if let Some(hit) = self.cache.read().await.get(&key) {
            return Ok(hit.clone());
        }

        let embedding = self.embed_with_retry(text).await?;
        self.check_dimension(&embedding)?;
        self.cache.write().await.insert(key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Array2<f32>> {
        // Futures are built up front so the stream holds no borrowing closure;
        // `buffered` keeps output order equal to input order
        let requests: Vec<_> = texts.iter().map(|text| self.embed_one(text)).collect();
        let rows: Vec<Vec<f32>> = stream::iter(requests)
            .buffered(MAX_IN_FLIGHT)
            .try_collect()
            .await?;
        stack_rows(rows)
    }
}
