pub mod api_error;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use captioner_core::pipeline::caption_pipeline::CaptionPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CaptionPipeline>,
}

impl AppState {
    pub fn new(pipeline: CaptionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// HTTP routes: `POST /transcribe`, `POST /render`, `GET /health`.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/transcribe", post(handlers::transcribe))
        .route("/render", post(handlers::render))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
