use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use ironvault_engine::LoanPipeline;

pub mod rest;

/// Uploads above this size are rejected before parsing.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub pipeline: LoanPipeline,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/loan", post(rest::api_loan))
        .route("/batch", post(rest::api_batch))
        .route("/health", get(rest::api_health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // The web client is served from a different origin
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method + path only; request bodies carry applicant data
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
