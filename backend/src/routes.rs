use std::path::Path;
use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use shared::ClientConfig;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

type SharedConfig = Arc<ClientConfig>;

/// API routes plus the built single-page app, with unknown paths falling
/// back to `index.html`.
pub fn app(client: ClientConfig, dist: &Path) -> Router {
    let spa = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));

    Router::new()
        .route("/api/config", get(client_config))
        .route("/api/health", get(health))
        .with_state(Arc::new(client))
        .fallback_service(spa)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn client_config(State(config): State<SharedConfig>) -> Json<ClientConfig> {
    tracing::debug!("serving client config");
    Json(ClientConfig::clone(&config))
}

async fn health() -> &'static str {
    "ok"
}
