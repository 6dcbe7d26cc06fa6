//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod download;
pub mod health;
pub mod upload;

/// Creates the router with all routes. Upload middleware needs the state.
pub fn routes_with_state(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(download::routes())
        .merge(upload::routes(state))
}
