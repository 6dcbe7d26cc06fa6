//! Shared-secret check for protected routes.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The presented API key, if any.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Rejects requests without the configured API key before the body is read.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match state.uploads.authenticate(presented_key(request.headers())) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!(
                path = %request.uri().path(),
                error_code = e.error_code(),
                "Rejected request without a valid API key"
            );
            (StatusCode::UNAUTHORIZED, e.user_message()).into_response()
        }
    }
}
