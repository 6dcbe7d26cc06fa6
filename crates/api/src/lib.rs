//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The upload, download and key-check routes
//! - API key middleware
//! - Response types

pub mod middleware;
pub mod response;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use oneshot_core::delivery::{ClaimRegistry, CleanupQueue, DeliveryService};
use oneshot_core::storage::StorageService;
use oneshot_core::upload::UploadService;
use oneshot_shared::AppConfig;

use crate::middleware::api_key::API_KEY_HEADER;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validated configuration.
    pub config: Arc<AppConfig>,
    /// Upload admission.
    pub uploads: Arc<UploadService>,
    /// One-time delivery.
    pub deliveries: Arc<DeliveryService>,
}

impl AppState {
    /// Wire the services over `storage` and spawn the cleanup worker.
    ///
    /// The returned queue must be kept and shut down after the server stops.
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn assemble(config: AppConfig, storage: Arc<StorageService>) -> (Self, CleanupQueue) {
        let claims = Arc::new(ClaimRegistry::new());
        let cleanup = CleanupQueue::spawn(
            storage.clone(),
            claims.clone(),
            Duration::from_millis(config.cleanup_delay_ms),
        );

        let uploads = UploadService::new(&config, storage.clone());
        let deliveries = DeliveryService::new(&config, storage, claims, cleanup.scheduler());

        let state = Self {
            config: Arc::new(config),
            uploads: Arc::new(uploads),
            deliveries: Arc::new(deliveries),
        };
        (state, cleanup)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes_with_state(&state))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([
            HeaderName::from_static(API_KEY_HEADER),
        ]))
        .with_state(state)
}
