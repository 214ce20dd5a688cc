use actix_web::{error, web, HttpResponse};

use crate::types::ErrorResponse;

pub mod documents;
pub mod search;
pub mod system;

/// Register every route and a JSON error handler that answers 400 with an
/// `ErrorResponse` body
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(1 << 20)
        .error_handler(|err, _req| {
            let body = ErrorResponse {
                error: format!("Invalid JSON body: {}", err),
            };
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        });

    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse {
            error: format!("Invalid query string: {}", err),
        };
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.app_data(json_config)
        .app_data(query_config)
        .service(documents::add_document)
        .service(documents::add_documents)
        .service(documents::list_documents)
        .service(documents::get_document)
        .service(documents::clear_documents)
        .service(search::search)
        .service(search::stats)
        .service(search::rebuild_index)
        .service(system::health);
}
