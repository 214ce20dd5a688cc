use semstore_common::{Result, SemStoreError};
use semstore_embed::Embedder;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::index::{FlatIndex, IndexState};
use crate::store::DocumentStore;
use crate::types::{Document, NewDocument, QueryResult, StoreState, StoreStatus};

#[derive(Debug, Default)]
struct Inner {
    documents: DocumentStore,
    index: IndexState,
}

/// In-memory semantic document store
///
/// Documents and index sit behind one lock. Writers (`add`, `add_many`,
/// `clear`, `rebuild`) hold it exclusively across the embedding calls, and
/// `search` holds it shared for the whole query, so a search never sees a
/// half-rebuilt index and always sees every completed add.
pub struct SemanticStore {
    inner: RwLock<Inner>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticStore {
    /// Create an empty store
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        info!("Semantic store initialized - model: {}", embedder.model());
        Self {
            inner: RwLock::new(Inner::default()),
            embedder,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Add a document and rebuild the index before returning
    pub async fn add(&self, title: &str, text: &str) -> Result<Document> {
        DocumentStore::validate(title, text)?;

        let mut inner = self.inner.write().await;

        let mut texts = inner.documents.texts();
        texts.push(text.to_string());
        let index = self.build_index(&texts).await?;

        let document = inner.documents.push(title, text)?;
        inner.index = IndexState::Ready(index);

        info!(
            "Document added: id={} title={:?} ({} total)",
            document.id,
            document.title,
            inner.documents.len()
        );
        Ok(document)
    }

    /// Add several documents with a single rebuild; all or nothing
    pub async fn add_many(&self, items: &[NewDocument]) -> Result<Vec<Document>> {
        DocumentStore::validate_all(items)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut inner = self.inner.write().await;

        let mut texts = inner.documents.texts();
        texts.extend(items.iter().map(|item| item.text.clone()));
        let index = self.build_index(&texts).await?;

        let mut added = Vec::with_capacity(items.len());
        for item in items {
            added.push(inner.documents.push(&item.title, &item.text)?);
        }
        inner.index = IndexState::Ready(index);

        info!("Added {} documents ({} total)", added.len(), inner.documents.len());
        Ok(added)
    }

    /// All documents in insertion order
    pub async fn list(&self) -> Vec<Document> {
        self.inner.read().await.documents.list()
    }

    /// Document by id
    pub async fn get(&self, id: u64) -> Option<Document> {
        self.inner.read().await.documents.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }

    /// Remove all documents and drop the index
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        let removed = inner.documents.len();
        inner.documents.clear();
        inner.index = IndexState::Uninitialized;
        self.embedder.reset().await;
        info!("Store cleared - {} documents removed", removed);
    }

    /// Re-embed the whole corpus and replace the index.
    ///
    /// On failure the documents are kept and the index is marked stale.
    pub async fn rebuild(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        self.rebuild_locked(&mut inner).await
    }

    /// Top-k documents for `query`, highest inner product first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<QueryResult>> {
        if query.trim().is_empty() {
            return Err(SemStoreError::validation("Query cannot be empty"));
        }
        if k == 0 {
            return Err(SemStoreError::validation("k must be positive"));
        }

        {
            let inner = self.inner.read().await;
            match &inner.index {
                IndexState::Uninitialized => {
                    debug!("Search on empty store: {:?}", query);
                    return Ok(Vec::new());
                }
                IndexState::Ready(index) => {
                    return self.search_index(&inner.documents, index, query, k).await;
                }
                IndexState::Stale => {}
            }
        }

        warn!("Index is stale, rebuilding before search");
        let mut inner = self.inner.write().await;
        // Another writer may have fixed or cleared it while we waited
        if matches!(inner.index, IndexState::Stale) {
            self.rebuild_locked(&mut inner).await?;
        }

        let inner = inner.downgrade();
        match &inner.index {
            IndexState::Ready(index) => self.search_index(&inner.documents, index, query, k).await,
            _ => Ok(Vec::new()),
        }
    }

    /// Current counts, model and lifecycle state
    pub async fn status(&self) -> StoreStatus {
        let inner = self.inner.read().await;
        let state = match inner.index {
            IndexState::Uninitialized => StoreState::Empty,
            IndexState::Ready(_) => StoreState::Ready,
            IndexState::Stale => StoreState::Stale,
        };

        StoreStatus {
            documents: inner.documents.len(),
            dimension: inner.index.dimension().or_else(|| self.embedder.dimension()),
            model: self.embedder.model().to_string(),
            state,
        }
    }

    async fn rebuild_locked(&self, inner: &mut Inner) -> Result<()> {
        if inner.documents.is_empty() {
            inner.index = IndexState::Uninitialized;
            return Ok(());
        }

        match self.build_index(&inner.documents.texts()).await {
            Ok(index) => {
                info!("Index rebuilt - {} vectors", index.len());
                inner.index = IndexState::Ready(index);
                Ok(())
            }
            Err(e) => {
                warn!("Index rebuild failed, marking stale: {}", e);
                inner.index = IndexState::Stale;
                Err(e)
            }
        }
    }

    async fn build_index(&self, texts: &[String]) -> Result<FlatIndex> {
        let matrix = self.embedder.embed_many(texts).await?;
        if matrix.nrows() != texts.len() {
            return Err(SemStoreError::embedding(format!(
                "Embedder returned {} vectors for {} texts",
                matrix.nrows(),
                texts.len()
            )));
        }
        debug!("Embedding matrix built: {:?}", matrix.dim());
        FlatIndex::build(matrix)
    }

    async fn search_index(
        &self,
        documents: &DocumentStore,
        index: &FlatIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<QueryResult>> {
        let query_vector = self.embedder.embed_one(query).await?;

        let hits = match index.search(&query_vector, k) {
            Err(SemStoreError::EmptyIndex) => return Ok(Vec::new()),
            other => other?,
        };

        let results: Vec<QueryResult> = hits
            .into_iter()
            .filter_map(|hit| {
                documents
                    .at(hit.position)
                    .map(|document| QueryResult::new(document, hit.score))
            })
            .collect();

        debug!(
            "Search completed - query={:?} k={} results={}",
            query,
            k,
            results.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ndarray::Array2;
    use semstore_embed::HashingEmbedder;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Hashing embedder with a failure switch and call counters
    struct FlakyEmbedder {
        inner: HashingEmbedder,
        failing: AtomicBool,
        batches: AtomicUsize,
        resets: AtomicUsize,
    }

    impl FlakyEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: HashingEmbedder::new(256).unwrap(),
                failing: AtomicBool::new(false),
                batches: AtomicUsize::new(0),
                resets: AtomicUsize::new(0),
            })
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(SemStoreError::embedding("model unavailable"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        fn model(&self) -> &str {
            "flaky"
        }

        fn dimension(&self) -> Option<usize> {
            self.inner.dimension()
        }

        async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
            self.check()?;
            self.inner.embed_one(text).await
        }

        async fn embed_many(&self, texts: &[String]) -> Result<Array2<f32>> {
            self.check()?;
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_many(texts).await
        }

        async fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn hashing_store() -> SemanticStore {
        SemanticStore::new(Arc::new(HashingEmbedder::new(256).unwrap()))
    }

    async fn seeded_store() -> SemanticStore {
        let store = hashing_store();
        store
            .add("Rust ownership", "ownership and borrowing rules in rust")
            .await
            .unwrap();
        store
            .add("Sourdough", "bake sourdough bread with a starter and flour")
            .await
            .unwrap();
        store
            .add("Tides", "the moon pulls ocean tides twice a day")
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insertion_order() {
        let store = seeded_store().await;
        let documents = store.list().await;
        let ids: Vec<u64> = documents.iter().map(|d| d.id).collect();
        let titles: Vec<&str> = documents.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(titles, vec!["Rust ownership", "Sourdough", "Tides"]);
    }

    #[tokio::test]
    async fn test_self_retrieval() {
        let store = seeded_store().await;
        let results = store
            .search("bake sourdough bread with a starter and flour", 3)
            .await
            .unwrap();
        assert_eq!(results[0].id, 2);
        assert_eq!(results[0].title, "Sourdough");
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = hashing_store();
        assert!(store.search("anything", 3).await.unwrap().is_empty());

        let store = seeded_store().await;
        store.clear().await;
        assert!(store.search("anything", 3).await.unwrap().is_empty());
        assert_eq!(store.status().await.state, StoreState::Empty);
    }

    #[tokio::test]
    async fn test_k_clamped_to_document_count() {
        let store = hashing_store();
        store.add("one", "alpha beta gamma").await.unwrap();
        store.add("two", "delta epsilon alpha").await.unwrap();

        let results = store.search("alpha", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_validation_has_no_side_effects() {
        let store = seeded_store().await;

        assert!(store.add("", "text").await.unwrap_err().is_validation());
        assert!(store.add("title", "").await.unwrap_err().is_validation());
        assert!(store.search("", 3).await.unwrap_err().is_validation());
        assert!(store.search("q", 0).await.unwrap_err().is_validation());

        assert_eq!(store.len().await, 3);
        assert_eq!(store.status().await.state, StoreState::Ready);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let store = seeded_store().await;
        store.add("Duplicate", "the moon pulls ocean tides twice a day").await.unwrap();

        let first = store.search("moon tides", 4).await.unwrap();
        let second = store.search("moon tides", 4).await.unwrap();
        assert_eq!(first, second);
        // Identical texts tie; the earlier document wins
        assert_eq!(first[0].id, 3);
        assert_eq!(first[1].id, 4);
    }

    #[tokio::test]
    async fn test_add_is_visible_to_next_search() {
        let store = seeded_store().await;
        let added = store
            .add("Volcano", "magma chamber eruption basalt")
            .await
            .unwrap();
        assert_eq!(added.id, 4);

        let results = store.search("basalt eruption", 1).await.unwrap();
        assert_eq!(results[0].id, 4);
    }

    #[tokio::test]
    async fn test_add_many() {
        let store = seeded_store().await;
        let added = store
            .add_many(&[
                NewDocument::new("Chess", "opening gambit sacrifices a pawn"),
                NewDocument::new("Orbits", "kepler laws describe planetary orbits"),
            ])
            .await
            .unwrap();
        assert_eq!(added.iter().map(|d| d.id).collect::<Vec<_>>(), vec![4, 5]);

        let results = store.search("planetary orbits", 1).await.unwrap();
        assert_eq!(results[0].title, "Orbits");
    }

    #[tokio::test]
    async fn test_add_many_is_all_or_nothing() {
        let store = seeded_store().await;
        let err = store
            .add_many(&[NewDocument::new("ok", "fine"), NewDocument::new("", "bad")])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.len().await, 3);
        assert!(store.add_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_state_unchanged() {
        let embedder = FlakyEmbedder::new();
        let store = SemanticStore::new(embedder.clone());
        store.add("first", "ocean waves").await.unwrap();

        embedder.set_failing(true);
        let err = store.add("second", "mountain peaks").await.unwrap_err();
        assert!(matches!(err, SemStoreError::Embedding(_)));
        assert_eq!(store.len().await, 1);
        assert_eq!(store.status().await.state, StoreState::Ready);

        embedder.set_failing(false);
        let results = store.search("ocean waves", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
    }

    #[tokio::test]
    async fn test_failed_rebuild_marks_stale() {
        let embedder = FlakyEmbedder::new();
        let store = SemanticStore::new(embedder.clone());
        store.add("first", "ocean waves").await.unwrap();
        store.add("second", "mountain peaks").await.unwrap();

        embedder.set_failing(true);
        assert!(store.rebuild().await.is_err());
        assert_eq!(store.status().await.state, StoreState::Stale);
        assert_eq!(store.len().await, 2);

        // Still failing: the search must not serve the old index
        let err = store.search("ocean", 3).await.unwrap_err();
        assert!(matches!(err, SemStoreError::Embedding(_)));
        assert_eq!(store.status().await.state, StoreState::Stale);

        // Recovered: the search rebuilds first
        embedder.set_failing(false);
        let before = embedder.batches.load(Ordering::SeqCst);
        let results = store.search("mountain peaks", 1).await.unwrap();
        assert_eq!(results[0].id, 2);
        assert_eq!(embedder.batches.load(Ordering::SeqCst), before + 1);
        assert_eq!(store.status().await.state, StoreState::Ready);
    }

    #[tokio::test]
    async fn test_clear_recovers_from_stale() {
        let embedder = FlakyEmbedder::new();
        let store = SemanticStore::new(embedder.clone());
        store.add("first", "ocean waves").await.unwrap();

        embedder.set_failing(true);
        assert!(store.rebuild().await.is_err());
        store.clear().await;
        assert_eq!(store.status().await.state, StoreState::Empty);
        assert!(store.search("ocean", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_embedder() {
        let embedder = FlakyEmbedder::new();
        let store = SemanticStore::new(embedder.clone());
        store.add("first", "ocean waves").await.unwrap();
        assert_eq!(embedder.resets.load(Ordering::SeqCst), 0);

        store.clear().await;
        assert_eq!(embedder.resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tokenless_text_rejected() {
        let store = seeded_store().await;

        assert!(store.add("Punct", "!!! ---").await.unwrap_err().is_validation());
        assert!(store.search("???", 3).await.unwrap_err().is_validation());
        assert_eq!(store.len().await, 3);
        assert_eq!(store.status().await.state, StoreState::Ready);
    }

    #[tokio::test]
    async fn test_status_and_get() {
        let store = seeded_store().await;
        let status = store.status().await;
        assert_eq!(status.documents, 3);
        assert_eq!(status.dimension, Some(256));
        assert_eq!(status.model, "hashing-256");

        assert_eq!(store.get(3).await.map(|d| d.title), Some("Tides".to_string()));
        assert!(store.get(9).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_serialized() {
        let store = Arc::new(hashing_store());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add(&format!("doc {i}"), &format!("unique token{i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let ids: Vec<u64> = store.list().await.iter().map(|d| d.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
        assert_eq!(store.search("token3", 8).await.unwrap().len(), 8);
    }
}
