use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::CoordinatorState;

/// Builds the Coordinator's axum router (spec.md §6 Coordinator HTTP
/// surface), grounded on the `Router::new().route(...).with_state(...)`
/// convention used by `kimberlite-sim`'s dashboard server.
pub fn build_router(state: Arc<CoordinatorState>) -> Router {
    Router::new()
        .route("/produce", post(handlers::produce))
        .route("/consume/{key}", get(handlers::consume))
        .route("/ring", get(handlers::ring))
        .route("/route/{key}", get(handlers::route))
        .route("/health/nodes", get(handlers::health_nodes))
        .route("/failover/status", get(handlers::failover_status))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
