//! Webhook authentication and error taxonomy shared by every inbound source.

mod errors;
mod signature;

pub use errors::{WebhookError, WebhookSource};
pub use signature::{
    compute_signature, signature_header, verify, HmacWebhookVerifier, SignatureError,
    SignatureHeader, WebhookVerifier, MAX_TIMESTAMP_DRIFT_SECS,
};
