//! HTTP handlers for inbound webhooks.
//!
//! Every failure is caught here and turned into the status the provider
//! expects; see `WebhookError::status_code_for`.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{DeliveryEndpointStatus, WebhookAck, WebhookErrorResponse};
use crate::adapters::http::AppState;
use crate::application::{RecordDeliveryEventCommand, ProcessPaymentEventCommand};
use crate::domain::delivery::DeliveryEnvelope;
use crate::domain::payment::PaymentEvent;
use crate::domain::webhook::{WebhookError, WebhookSource, WebhookVerifier};

pub const PAYMENT_SIGNATURE_HEADER: &str = "Payment-Signature";
pub const DELIVERY_SIGNATURE_HEADER: &str = "Delivery-Signature";

/// POST /webhooks/payments
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process_payment(&state, &headers, &body).await {
        Ok(()) => (StatusCode::OK, Json(WebhookAck::received())).into_response(),
        Err(err) => webhook_error_response(WebhookSource::Payment, err),
    }
}

/// POST /webhooks/delivery
pub async fn handle_delivery_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process_delivery(&state, &headers, &body).await {
        Ok(()) => (StatusCode::OK, Json(WebhookAck::received())).into_response(),
        Err(err) => webhook_error_response(WebhookSource::Delivery, err),
    }
}

/// GET /webhooks/delivery
pub async fn delivery_webhook_status() -> Json<DeliveryEndpointStatus> {
    Json(DeliveryEndpointStatus::ok())
}

async fn process_payment(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
    let verifier = state
        .payment_verifier
        .as_deref()
        .ok_or(WebhookError::MissingConfiguration("payment.webhook_secret"))?;
    authenticate(verifier, headers, PAYMENT_SIGNATURE_HEADER, body)?;

    let event = PaymentEvent::from_slice(body)?;
    state
        .process_payment_handler()
        .handle(ProcessPaymentEventCommand { event })
        .await?;
    Ok(())
}

async fn process_delivery(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
    let verifier = state
        .delivery_verifier
        .as_deref()
        .ok_or(WebhookError::MissingConfiguration("email.webhook_secret"))?;
    authenticate(verifier, headers, DELIVERY_SIGNATURE_HEADER, body)?;

    let envelope = DeliveryEnvelope::from_slice(body)?;
    state
        .record_delivery_handler()
        .handle(RecordDeliveryEventCommand { envelope })
        .await?;
    Ok(())
}

fn authenticate(
    verifier: &dyn WebhookVerifier,
    headers: &HeaderMap,
    header_name: &str,
    body: &[u8],
) -> Result<(), WebhookError> {
    let signature = headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::SignatureInvalid)?;
    verifier.verify(body, signature)?;
    Ok(())
}

fn webhook_error_response(source: WebhookSource, err: WebhookError) -> Response {
    let status = err.status_code_for(source);

    if status == StatusCode::OK {
        tracing::info!(source = source.as_str(), reason = %err, "Webhook acknowledged without processing");
        return (status, Json(WebhookAck::received())).into_response();
    }

    if status.is_server_error() {
        tracing::error!(source = source.as_str(), error = %err, retryable = err.is_retryable(), "Webhook processing failed");
    } else {
        tracing::warn!(source = source.as_str(), error = %err, "Webhook rejected");
    }
    (status, Json(WebhookErrorResponse::from(&err))).into_response()
}
