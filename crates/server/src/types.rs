use semstore_vector::{Document, NewDocument, QueryResult};
use serde::{Deserialize, Serialize};

/// Add document request
#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    /// Document title
    pub title: String,

    /// Document text
    pub text: String,
}

/// Batch add request
#[derive(Debug, Deserialize)]
pub struct BatchAddRequest {
    /// Documents to add, in order
    pub documents: Vec<NewDocument>,
}

/// Document list response
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub count: usize,
}

impl From<Vec<Document>> for DocumentListResponse {
    fn from(documents: Vec<Document>) -> Self {
        let count = documents.len();
        Self { documents, count }
    }
}

/// Search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query text
    pub q: String,

    /// Top K results; signed so that non-positive values can be rejected
    #[serde(default, alias = "top_k")]
    pub k: Option<i64>,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<QueryResult>,
    pub count: usize,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
