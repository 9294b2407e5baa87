//! HTTP adapter for inbound webhooks.
//!
//! - `POST /webhooks/payments` - Payment provider confirmations
//! - `POST /webhooks/delivery` - Email provider delivery-status events
//! - `GET /webhooks/delivery` - Endpoint liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{DELIVERY_SIGNATURE_HEADER, PAYMENT_SIGNATURE_HEADER};
pub use routes::webhook_routes;
