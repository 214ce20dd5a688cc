use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// 1-based insertion number
    pub id: u64,

    /// Document title
    pub title: String,

    /// Document body, the part that gets embedded
    pub text: String,

    /// Timestamp when added
    pub added_at: DateTime<Utc>,
}

/// Title/text pair submitted for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub text: String,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Search hit joined back to its document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Document ID
    pub id: u64,

    /// Document title
    pub title: String,

    /// Document text
    pub text: String,

    /// Raw inner product between query and document vectors
    pub score: f32,
}

impl QueryResult {
    pub fn new(document: &Document, score: f32) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
            text: document.text.clone(),
            score,
        }
    }
}

/// Coarse lifecycle of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    /// No documents, no index
    Empty,
    /// Index matches the current documents
    Ready,
    /// Documents exist but the last rebuild failed
    Stale,
}

/// Store statistics for display
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    /// Number of stored documents
    pub documents: usize,

    /// Embedding dimension, once known
    pub dimension: Option<usize>,

    /// Embedding model used
    pub model: String,

    /// Lifecycle state
    pub state: StoreState,
}
