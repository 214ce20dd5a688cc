use async_trait::async_trait;
use ndarray::Array2;
use semstore_common::{Result, SemStoreError};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::embedder::{validate_text, Embedder};

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// Each lowercased alphanumeric token is hashed with SHA-256 into one of
/// `dimension` buckets with a +1/-1 sign, and the resulting vector is scaled
/// to unit length. Texts sharing vocabulary get a high inner product; no model
/// files or network access are involved.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model: String,
}

impl HashingEmbedder {
    /// Create a hashing embedder with the given output dimension
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(SemStoreError::config("Hashing dimension cannot be 0"));
        }
        Ok(Self {
            dimension,
            model: format!("hashing-{}", dimension),
        })
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    /// Hash `text` into a unit vector; text without any token is rejected
    /// rather than mapped to the zero vector.
    fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;

        let mut vector = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in Self::tokens(text) {
            tokens += 1;
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        if tokens == 0 {
            return Err(SemStoreError::validation(
                "Text has no letters or digits to embed",
            ));
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.vectorize(text)
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Array2<f32>> {
        let mut matrix = Array2::zeros((texts.len(), self.dimension));
        for (mut row, text) in matrix.rows_mut().into_iter().zip(texts) {
            for (slot, value) in row.iter_mut().zip(self.vectorize(text)?) {
                *slot = value;
            }
        }
        debug!("Hashed {} texts into {} dimensions", texts.len(), self.dimension);
        Ok(matrix)
    }
}
