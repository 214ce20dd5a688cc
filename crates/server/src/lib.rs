//! SemStore HTTP server
//!
//! Actix-web REST API over a single in-memory `SemanticStore`.

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

use actix_web::{web, App, HttpServer};
use semstore_common::{AppConfig, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

pub use state::AppState;

/// Run the HTTP server until it is shut down
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_addr = config.server_bind_address();
    let state = Arc::new(AppState::new(config)?);
    serve(state, &bind_addr).await
}

/// Run the HTTP server over an existing state
pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> Result<()> {
    info!(
        "Starting server on http://{} (embedder: {})",
        bind_addr,
        state.store.embedder().model()
    );

    match state.store.embedder().health_check().await {
        Ok(true) => info!("Embedder reachable"),
        Ok(false) => warn!("Embedder responded with an error; adds will fail until it recovers"),
        Err(e) => warn!("Embedder unreachable ({}); adds will fail until it recovers", e),
    }

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
