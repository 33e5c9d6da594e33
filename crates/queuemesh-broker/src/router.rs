use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::BrokerState;

/// Builds the Broker's axum router (spec.md §6 Broker HTTP surface).
pub fn build_router(state: Arc<BrokerState>) -> Router {
    Router::new()
        .route("/store", post(handlers::store))
        .route("/replicate", post(handlers::replicate))
        .route("/fetch/{key}", get(handlers::fetch))
        .route("/health", get(handlers::health))
        .route("/messages", get(handlers::messages))
        .route("/log", get(handlers::log))
        .route("/promote", post(handlers::promote))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
