use async_trait::async_trait;
use ndarray::Array2;
use semstore_common::{Result, SemStoreError};

/// Common trait for embedding backends
///
/// Implementations must be deterministic for a fixed model: the same text
/// always yields the same vector, so index rebuilds are reproducible.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for display and cache keys
    fn model(&self) -> &str;

    /// Output dimension, if already known
    fn dimension(&self) -> Option<usize>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    /// Whether the backing model is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Forget per-corpus state such as cached vectors
    async fn reset(&self) {}

    /// Embed texts in order, one row per text
    async fn embed_many(&self, texts: &[String]) -> Result<Array2<f32>> {
        let mut rows = Vec::with_capacity(texts.len());
        for text in texts {
            rows.push(self.embed_one(text).await?);
        }
        stack_rows(rows)
    }
}

/// Reject empty (or whitespace-only) input before it reaches a model
pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SemStoreError::validation("Cannot embed empty text"));
    }
    Ok(())
}

/// Stack equally sized rows into an `[rows, dim]` matrix
pub fn stack_rows(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let n = rows.len();
    let dim = rows.first().map_or(0, Vec::len);

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        return Err(SemStoreError::embedding(format!(
            "Inconsistent embedding dimension: row {} has {} values, expected {}",
            i,
            row.len(),
            dim
        )));
    }

    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, dim), flat)
        .map_err(|e| SemStoreError::embedding(format!("Failed to build embedding matrix: {}", e)))
}
