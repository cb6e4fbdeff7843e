use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.server.max_upload_size as usize;

    Router::new()
        .route("/health", get(handlers::health))
        // Buckets
        .route("/bucket/create/:bucket", post(handlers::create_bucket))
        .route("/bucket/:bucket/files", get(handlers::list_files))
        // Files
        .route(
            "/bucket/:bucket/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/bucket/:bucket/download/:filename",
            get(handlers::download_file),
        )
        .route("/bucket/:bucket/file/:filename", delete(handlers::delete_file))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
