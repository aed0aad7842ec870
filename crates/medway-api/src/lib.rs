//! HTTP surface for the ingestion and streaming pipeline.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod range;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/v0/images", post(handlers::ingest::upload_images))
        .route("/api/v0/videos", post(handlers::ingest::upload_videos))
        .route("/api/v0/images/file", get(handlers::fetch::fetch_image))
        .route("/api/v0/stream", get(handlers::stream::stream_media))
        .merge(
            RapiDoc::with_openapi("/api-docs/openapi.json", api_doc::ApiDoc::openapi())
                .path("/rapidoc"),
        )
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
