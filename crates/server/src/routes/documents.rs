use actix_web::{delete, get, post, web, HttpResponse};
use semstore_common::SemStoreError;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{AddDocumentRequest, BatchAddRequest, DocumentListResponse, SuccessResponse};

/// Add a single document; the index is rebuilt before the response
#[post("/documents")]
pub async fn add_document(
    req: web::Json<AddDocumentRequest>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let document = state.store.add(&req.title, &req.text).await?;
    Ok(HttpResponse::Created().json(document))
}

#[post("/documents/batch")]
pub async fn add_documents(
    req: web::Json<BatchAddRequest>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let documents = state.store.add_many(&req.documents).await?;
    Ok(HttpResponse::Created().json(DocumentListResponse::from(documents)))
}

#[get("/documents")]
pub async fn list_documents(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let documents = state.store.list().await;
    Ok(HttpResponse::Ok().json(DocumentListResponse::from(documents)))
}

#[get("/documents/{id}")]
pub async fn get_document(
    path: web::Path<u64>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let document = state
        .store
        .get(id)
        .await
        .ok_or_else(|| SemStoreError::not_found(format!("Document {}", id)))?;
    Ok(HttpResponse::Ok().json(document))
}

/// Remove every document
#[delete("/documents")]
pub async fn clear_documents(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    state.store.clear().await;
    Ok(HttpResponse::Ok().json(SuccessResponse {
        success: true,
        message: Some("All documents removed".to_string()),
    }))
}
