//! Router for webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{delivery_webhook_status, handle_delivery_webhook, handle_payment_webhook};
use crate::adapters::http::AppState;

/// Webhook routes, mounted at `/webhooks`.
///
/// # Routes
/// - `POST /payments` - Payment confirmations (signature verified)
/// - `POST /delivery` - Email delivery-status events (signature verified)
/// - `GET /delivery` - Liveness and supported event types
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(handle_payment_webhook))
        .route(
            "/delivery",
            post(handle_delivery_webhook).get(delivery_webhook_status),
        )
}
