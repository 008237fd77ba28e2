//! Route definitions

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{handlers, state::AppState, state::GatewayState};

/// Routes of the model service
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/predict", get(handlers::predict))
        .route("/predict/proba", get(handlers::predict_proba))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes of the gateway
pub fn create_gateway_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/predict", get(handlers::gateway_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
