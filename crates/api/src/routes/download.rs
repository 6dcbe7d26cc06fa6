//! One-time download endpoint.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{MethodFilter, on},
};
use tracing::error;

use oneshot_core::delivery::DeliveryError;

use crate::AppState;

/// Stream the object once, then let it be deleted.
async fn download(State(state): State<AppState>, Path(identifier): Path<String>) -> Response {
    match state.deliveries.open(&identifier).await {
        Ok(delivery) => {
            let headers = [
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename={}", delivery.identifier),
                ),
                (CONTENT_TYPE, "application/octet-stream".to_string()),
                (CONTENT_LENGTH, delivery.size.to_string()),
                (CACHE_CONTROL, "no-store".to_string()),
            ];
            (headers, Body::from_stream(delivery.stream)).into_response()
        }
        Err(e) => {
            if let DeliveryError::StorageReadFailed(source) = &e {
                error!(identifier = %identifier, error = %source, "Download failed");
            }
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, e.user_message()).into_response()
        }
    }
}

/// Creates download routes.
pub fn routes() -> Router<AppState> {
    // GET only: HEAD must not consume the object.
    Router::new().route("/download/{identifier}", on(MethodFilter::GET, download))
}
