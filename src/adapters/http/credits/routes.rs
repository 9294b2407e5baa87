//! Router for credit endpoints.

use axum::{routing::get, Router};

use super::handlers::get_credit_summary;
use crate::adapters::http::AppState;

/// Credit routes, mounted at `/api/credits`.
///
/// # Routes
/// - `GET /:owner_id` - Balance, decay projection and account status
pub fn credit_routes() -> Router<AppState> {
    Router::new().route("/:owner_id", get(get_credit_summary))
}
