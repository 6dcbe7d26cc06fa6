//! Health check and API key check endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{MethodFilter, get, on},
};
use serde::Serialize;

use crate::AppState;
use crate::middleware::api_key::presented_key;
use crate::response::ApiResponse;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Lets clients verify their key. Always 200; the body says whether it matched.
async fn key_check(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    match state.uploads.authenticate(presented_key(&headers)) {
        Ok(()) => ApiResponse::key_valid(state.uploads.max_file_size()),
        Err(_) => ApiResponse::failure("Invalid API key"),
    }
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/test", on(MethodFilter::GET, key_check))
}
