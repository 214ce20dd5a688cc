use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use semstore_common::SemStoreError;
use tracing::error;

use crate::types::ErrorResponse;

/// HTTP wrapper for store errors
#[derive(Debug)]
pub struct ApiError(pub SemStoreError);

impl From<SemStoreError> for ApiError {
    fn from(err: SemStoreError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.0.to_string(),
        })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(SemStoreError::validation("Query cannot be empty"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(SemStoreError::embedding("model unavailable"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = ApiError::from(SemStoreError::not_found("Document 4"));
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }
}
