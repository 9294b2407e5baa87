//! Signed webhook verification.
//!
//! Both inbound webhook sources sign the same way: the sender computes
//! `base64(HMAC-SHA256(secret, "{timestamp}.{raw_body}"))` and sends it in a
//! composite header of comma-separated `key=value` pairs:
//!
//! ```text
//! timestamp=1704067200,signature=3q2+7w==
//! ```
//!
//! [`HmacWebhookVerifier`] implements the check once; each source gets its own
//! instance holding its own secret.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Maximum distance between the signed timestamp and now, in either direction.
pub const MAX_TIMESTAMP_DRIFT_SECS: i64 = 300;

/// Why a signature was rejected.
///
/// Callers that only need a yes/no answer use [`verify`]; the reason exists
/// for log lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Header missing a required field or not in `key=value` form.
    #[error("malformed signature header: {0}")]
    MalformedHeader(&'static str),

    /// Signed timestamp is outside the freshness window.
    #[error("signature timestamp outside the {MAX_TIMESTAMP_DRIFT_SECS}s window")]
    StaleTimestamp,

    /// Signature does not match the payload and secret.
    #[error("signature mismatch")]
    Mismatch,
}

/// Parsed components of the composite signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the sender signed.
    pub timestamp: i64,
    /// Decoded HMAC bytes.
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses `timestamp=<unix>,signature=<base64>[,<other>=<value>...]`.
    ///
    /// Unknown keys are ignored so senders can add fields later.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::MalformedHeader` when a pair has no `=`, the
    /// timestamp is not an integer, the signature is not base64, or either
    /// required field is absent.
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or(SignatureError::MalformedHeader("expected key=value pairs"))?;

            match key.trim() {
                "timestamp" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureError::MalformedHeader("invalid timestamp"))?,
                    );
                }
                "signature" => {
                    signature = Some(
                        BASE64
                            .decode(value.trim())
                            .map_err(|_| SignatureError::MalformedHeader("invalid signature encoding"))?,
                    );
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp.ok_or(SignatureError::MalformedHeader("missing timestamp"))?,
            signature: signature.ok_or(SignatureError::MalformedHeader("missing signature"))?,
        })
    }
}

/// Authenticity and freshness check for a signed webhook envelope.
pub trait WebhookVerifier: Send + Sync {
    /// Verifies `signature_header` against the raw request body.
    fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError>;
}

/// HMAC-SHA256 verifier parameterized only by its shared secret.
pub struct HmacWebhookVerifier {
    secret: SecretString,
}

impl HmacWebhookVerifier {
    /// Creates a verifier for one webhook source.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies against an explicit clock, in Unix seconds.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), SignatureError> {
        let header = SignatureHeader::parse(signature_header)?;

        if now.abs_diff(header.timestamp) > MAX_TIMESTAMP_DRIFT_SECS.unsigned_abs() {
            return Err(SignatureError::StaleTimestamp);
        }

        let expected = hmac_digest(
            self.secret.expose_secret().as_bytes(),
            header.timestamp,
            payload,
        );

        if constant_time_compare(&expected, &header.signature) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

impl WebhookVerifier for HmacWebhookVerifier {
    fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }
}

impl std::fmt::Debug for HmacWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacWebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Returns true if `header_value` is a fresh, valid signature of `raw_body`.
///
/// Fails closed: any parse problem yields `false`.
pub fn verify(raw_body: &[u8], header_value: &str, secret: &str) -> bool {
    HmacWebhookVerifier::new(SecretString::new(secret.to_string()))
        .verify(raw_body, header_value)
        .is_ok()
}

/// Computes the base64 signature a sender would put in the header.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    BASE64.encode(hmac_digest(secret.as_bytes(), timestamp, payload))
}

/// Builds a complete signature header value for `payload`.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!(
        "timestamp={},signature={}",
        timestamp,
        compute_signature(secret, timestamp, payload)
    )
}

fn hmac_digest(secret: &[u8], timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison; unequal lengths are rejected before comparing.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
