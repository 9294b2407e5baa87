//! Webhook error types.
//!
//! Every failure a webhook call can hit maps to exactly one HTTP status per
//! source. The status decides whether the provider retries: 2xx and 4xx stop
//! delivery, 5xx schedules a retry with backoff.

use http::StatusCode;
use thiserror::Error;

use super::signature::SignatureError;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Which inbound stream a webhook came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookSource {
    /// Payment provider (checkout confirmations).
    Payment,
    /// Email provider (delivery status events).
    Delivery,
}

impl WebhookSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookSource::Payment => "payment",
            WebhookSource::Delivery => "delivery",
        }
    }
}

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header missing, malformed, or not matching the payload.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Signed timestamp outside the freshness window.
    #[error("Stale or replayed signature")]
    StaleOrReplayed,

    /// Shared secret for this source is not configured.
    #[error("Missing configuration: {0}")]
    MissingConfiguration(&'static str),

    /// Verified body could not be parsed.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Event metadata lacks a field needed to process it.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Event was processed by an earlier delivery.
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    /// Write to the relational store failed.
    #[error("Storage write failure: {0}")]
    StorageWriteFailure(String),

    /// A referenced row does not exist.
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Event type this service does not handle.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::StorageWriteFailure(_) | WebhookError::MissingConfiguration(_)
        )
    }

    /// Maps the error to the HTTP status returned to `source`.
    ///
    /// The payment provider treats any 4xx as final, so signature failures
    /// are 400 there. The email provider expects 401 for authentication
    /// failures.
    pub fn status_code_for(&self, source: WebhookSource) -> StatusCode {
        match self {
            WebhookError::SignatureInvalid | WebhookError::StaleOrReplayed => match source {
                WebhookSource::Payment => StatusCode::BAD_REQUEST,
                WebhookSource::Delivery => StatusCode::UNAUTHORIZED,
            },

            WebhookError::Malformed(_) => StatusCode::BAD_REQUEST,

            // Acknowledged: retrying cannot change the outcome
            WebhookError::MissingMetadata(_)
            | WebhookError::AlreadyProcessed(_)
            | WebhookError::UnresolvedReference(_)
            | WebhookError::UnknownEventType(_) => StatusCode::OK,

            WebhookError::MissingConfiguration(_) | WebhookError::StorageWriteFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<SignatureError> for WebhookError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::StaleTimestamp => WebhookError::StaleOrReplayed,
            SignatureError::MalformedHeader(_) | SignatureError::Mismatch => {
                WebhookError::SignatureInvalid
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ForeignKeyViolation => WebhookError::UnresolvedReference(err.message),
            _ => WebhookError::StorageWriteFailure(err.to_string()),
        }
    }
}
