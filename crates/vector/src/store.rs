use chrono::Utc;
use semstore_common::{Result, SemStoreError};

use crate::types::{Document, NewDocument};

/// Ordered document collection.
///
/// IDs are `position + 1`. Nothing is ever removed individually, so the id of
/// a document doubles as its matrix row.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a title/text pair without touching the store
    pub fn validate(title: &str, text: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(SemStoreError::validation("Title cannot be empty"));
        }
        if text.trim().is_empty() {
            return Err(SemStoreError::validation("Text cannot be empty"));
        }
        Ok(())
    }

    /// Validate every pair first; nothing is appended if any fails
    pub fn validate_all(items: &[NewDocument]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            Self::validate(&item.title, &item.text).map_err(|e| match e {
                SemStoreError::Validation(msg) => {
                    SemStoreError::validation(format!("Document {}: {}", i + 1, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Append a document and return it
    pub fn push(&mut self, title: &str, text: &str) -> Result<Document> {
        Self::validate(title, text)?;

        let document = Document {
            id: self.documents.len() as u64 + 1,
            title: title.to_string(),
            text: text.to_string(),
            added_at: Utc::now(),
        };
        self.documents.push(document.clone());
        Ok(document)
    }

    /// All documents in insertion order
    pub fn list(&self) -> Vec<Document> {
        self.documents.clone()
    }

    /// Texts in insertion order, one per matrix row
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }

    /// Document at a matrix row
    pub fn at(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    /// Document by id
    pub fn get(&self, id: u64) -> Option<&Document> {
        let position = usize::try_from(id.checked_sub(1)?).ok()?;
        self.at(position).filter(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Remove everything; ids restart at 1
    pub fn clear(&mut self) {
        self.documents.clear();
    }
}
