//! Response bodies for webhook endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::delivery::DeliveryEventType;
use crate::domain::webhook::WebhookError;

/// Body returned whenever the provider should consider delivery done.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// Liveness body for `GET /webhooks/delivery`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryEndpointStatus {
    pub status: String,
    pub supported_events: Vec<String>,
}

impl DeliveryEndpointStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            supported_events: DeliveryEventType::ALL
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
        }
    }
}

/// Error body for rejected webhook calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookErrorResponse {
    pub error_code: String,
    pub message: String,
}

impl From<&WebhookError> for WebhookErrorResponse {
    fn from(err: &WebhookError) -> Self {
        let (code, message) = match err {
            WebhookError::SignatureInvalid => ("INVALID_SIGNATURE", "Invalid signature".to_string()),
            WebhookError::StaleOrReplayed => ("INVALID_SIGNATURE", "Invalid signature".to_string()),
            WebhookError::Malformed(_) => ("MALFORMED_PAYLOAD", "Payload could not be parsed".to_string()),
            WebhookError::MissingConfiguration(_) => {
                ("NOT_CONFIGURED", "Webhook endpoint is not configured".to_string())
            }
            WebhookError::StorageWriteFailure(_) => {
                ("PROCESSING_FAILED", "Event could not be processed".to_string())
            }
            other => ("NOT_PROCESSED", other.to_string()),
        };
        Self {
            error_code: code.to_string(),
            message,
        }
    }
}
