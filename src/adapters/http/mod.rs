//! HTTP adapters - REST API implementations.
//!
//! Each surface has its own module; `app_router` assembles them with the
//! shared middleware stack.

pub mod credits;
mod state;
pub mod webhooks;

use std::time::Duration;

use axum::{http::HeaderName, routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use credits::credit_routes;
pub use state::AppState;
pub use webhooks::webhook_routes;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full router.
///
/// Requests that exceed `request_timeout` are answered with 408 so a stuck
/// storage call never holds a provider connection open.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
        .nest("/api/credits", credit_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
