//! SemStore vector search engine
//!
//! In-memory document store with an exact inner-product index that is rebuilt
//! from the full corpus on every change.

mod engine;
mod index;
mod store;
mod types;

pub use engine::SemanticStore;
pub use index::{FlatIndex, Hit, IndexState};
pub use store::DocumentStore;
pub use types::{Document, NewDocument, QueryResult, StoreState, StoreStatus};
