use actix_web::{get, post, web, HttpResponse};
use semstore_common::SemStoreError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{SearchQuery, SearchResponse};

#[get("/search")]
pub async fn search(
    query: web::Query<SearchQuery>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let k = match query.k {
        None => state.config.default_top_k,
        Some(k) if k > 0 => usize::try_from(k).unwrap_or(usize::MAX),
        Some(k) => {
            return Err(SemStoreError::validation(format!("k must be positive, got {}", k)).into())
        }
    };
    debug!("Search request: q={:?} k={}", query.q, k);

    let results = state.store.search(&query.q, k).await?;
    let count = results.len();

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: query.q.clone(),
        results,
        count,
    }))
}

#[get("/stats")]
pub async fn stats(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.status().await))
}

/// Force a full re-embed, e.g. after the embedding service recovers
#[post("/index/rebuild")]
pub async fn rebuild_index(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    state.store.rebuild().await?;
    Ok(HttpResponse::Ok().json(state.store.status().await))
}
