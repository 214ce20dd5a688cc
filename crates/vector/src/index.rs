use ndarray::{Array2, ArrayView1};
use semstore_common::{Result, SemStoreError};
use std::cmp::Ordering;

/// One search hit: matrix row and its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Row in the embedding matrix (= insertion position)
    pub position: usize,

    /// Inner product with the query
    pub score: f32,
}

/// Exact inner-product index over an `[N, D]` embedding matrix.
///
/// Vectors are stored as given; nothing is normalized, so scores are raw dot
/// products. Search is brute force: one matrix-vector product per query.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    matrix: Array2<f32>,
}

impl FlatIndex {
    /// Build an index over all rows of `matrix`
    pub fn build(matrix: Array2<f32>) -> Result<Self> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            return Err(SemStoreError::EmptyIndex);
        }
        Ok(Self { matrix })
    }

    /// Number of indexed vectors
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    /// Always false for a built index
    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    /// Top `min(k, len)` rows by descending score.
    ///
    /// Equal scores keep ascending row order, so identical input always gives
    /// identical output.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if k == 0 {
            return Err(SemStoreError::validation("k must be positive"));
        }
        if query.len() != self.dimension() {
            return Err(SemStoreError::embedding(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimension()
            )));
        }

        let scores = self.matrix.dot(&ArrayView1::from(query));

        let mut positions: Vec<usize> = (0..scores.len()).collect();
        positions.sort_by(|&a, &b| descending(scores[a], scores[b]).then(a.cmp(&b)));
        positions.truncate(k);

        Ok(positions
            .into_iter()
            .map(|position| Hit {
                position,
                score: scores[position],
            })
            .collect())
    }
}

/// Descending order with NaN last
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Index lifecycle
#[derive(Debug, Clone, Default)]
pub enum IndexState {
    /// No documents have been indexed
    #[default]
    Uninitialized,
    /// Index built from the current documents
    Ready(FlatIndex),
    /// Documents exist but the last rebuild failed; must not be searched
    Stale,
}

impl IndexState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn dimension(&self) -> Option<usize> {
        match self {
            Self::Ready(index) => Some(index.dimension()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn index() -> FlatIndex {
        FlatIndex::build(array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5], [2.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_build_empty() {
        let err = FlatIndex::build(Array2::zeros((0, 4))).unwrap_err();
        assert!(matches!(err, SemStoreError::EmptyIndex));

        let err = FlatIndex::build(Array2::zeros((3, 0))).unwrap_err();
        assert!(matches!(err, SemStoreError::EmptyIndex));
    }

    #[test]
    fn test_search_orders_by_inner_product() {
        let hits = index().search(&[1.0, 0.0], 4).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        // Row 3 is not unit length and wins on raw inner product
        assert_eq!(positions, vec![3, 0, 2, 1]);
        assert_eq!(hits[0].score, 2.0);
        assert_eq!(hits[3].score, 0.0);
    }

    #[test]
    fn test_k_clamped_to_len() {
        let hits = index().search(&[0.0, 1.0], 10).unwrap();
        assert_eq!(hits.len(), 4);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_k_truncates() {
        let hits = index().search(&[0.0, 1.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 1);
        assert_eq!(hits[1].position, 2);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let index = FlatIndex::build(array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 0.0]]).unwrap();
        for _ in 0..3 {
            let hits = index.search(&[1.0, 0.0], 3).unwrap();
            let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
            assert_eq!(positions, vec![0, 2, 3]);
        }
    }

    #[test]
    fn test_nan_sorts_last() {
        let index = FlatIndex::build(array![[f32::NAN, 0.0], [1.0, 0.0], [-1.0, 0.0]]).unwrap();
        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 2, 0]);
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(index().search(&[1.0, 0.0], 0).unwrap_err().is_validation());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = index().search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, SemStoreError::Embedding(_)));
    }

    #[test]
    fn test_state_helpers() {
        assert!(!IndexState::Uninitialized.is_ready());
        assert!(!IndexState::Stale.is_ready());
        let ready = IndexState::Ready(index());
        assert!(ready.is_ready());
        assert_eq!(ready.dimension(), Some(2));
        assert_eq!(IndexState::Stale.dimension(), None);
    }
}
