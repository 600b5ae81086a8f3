//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware::RequestIdLayer, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // The wire protocol: one endpoint, operation named by the target header
        .route("/", post(handlers::api::dispatch))
        // Liveness endpoint
        .route("/health", get(handlers::health::health_check))
        // Attach state
        .with_state(state)
        // Middleware (first added = innermost)
        .layer(RequestIdLayer::new())
        .layer(TraceLayer::new_for_http())
}
