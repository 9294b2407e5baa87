//! Payment provider webhook event types.
//!
//! Only fields relevant to crediting an owner are captured. Everything else in
//! the provider's schema is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::OwnerId;
use crate::domain::webhook::WebhookError;

/// Payment provider webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: Option<i64>,

    /// Object containing event-specific data.
    pub data: PaymentEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: Value,
}

/// Event types this service distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventType {
    /// Checkout session paid; the only type that moves credits.
    CheckoutSessionCompleted,
    /// Anything else. Acknowledged and ignored.
    Other,
}

impl PaymentEventType {
    pub fn from_str(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            _ => Self::Other,
        }
    }
}

impl PaymentEvent {
    /// Parses a verified request body.
    pub fn from_slice(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::Malformed(e.to_string()))
    }

    pub fn parsed_type(&self) -> PaymentEventType {
        PaymentEventType::from_str(&self.event_type)
    }

    /// Checkout session id, when the object carries one.
    pub fn session_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(Value::as_str)
    }
}

/// Fields needed to credit an owner for a completed checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompletion {
    pub session_id: String,
    pub owner_id: OwnerId,
    pub product_type: String,
    pub credits_amount: i64,
    pub payment_intent_id: Option<String>,
    pub amount_paid: Option<i64>,
    pub currency: Option<String>,
}

impl CheckoutCompletion {
    /// Extracts the completion from a `checkout.session.completed` event.
    ///
    /// Metadata values may arrive as strings or numbers. `credits_amount`
    /// must be a positive integer.
    ///
    /// # Errors
    ///
    /// `WebhookError::MissingMetadata` naming the first absent or unusable
    /// field. Retrying the delivery cannot fix any of these.
    pub fn from_event(event: &PaymentEvent) -> Result<Self, WebhookError> {
        let object = &event.data.object;
        let session_id = event
            .session_id()
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingMetadata("session_id"))?
            .to_string();

        let metadata = object.get("metadata").unwrap_or(&Value::Null);

        let owner_id = metadata_string(metadata, "owner_id")
            .and_then(|s| OwnerId::new(s).ok())
            .ok_or(WebhookError::MissingMetadata("owner_id"))?;

        let product_type = metadata_string(metadata, "product_type")
            .ok_or(WebhookError::MissingMetadata("product_type"))?;

        let credits_amount = metadata_integer(metadata, "credits_amount")
            .filter(|amount| *amount > 0)
            .ok_or(WebhookError::MissingMetadata("credits_amount"))?;

        let payment_intent_id = match object.get("payment_intent") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Object(intent)) => intent.get("id").and_then(Value::as_str).map(String::from),
            _ => None,
        };

        Ok(Self {
            session_id,
            owner_id,
            product_type,
            credits_amount,
            payment_intent_id,
            amount_paid: object.get("amount_total").and_then(Value::as_i64),
            currency: object.get("currency").and_then(Value::as_str).map(String::from),
        })
    }
}

fn metadata_string(metadata: &Value, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn metadata_integer(metadata: &Value, key: &str) -> Option<i64> {
    match metadata.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(object: Value) -> PaymentEvent {
        serde_json::from_value(json!({
            "id": "evt_test_123",
            "type": "checkout.session.completed",
            "created": 1704067200,
            "data": { "object": object },
            "livemode": false
        }))
        .unwrap()
    }

    #[test]
    fn parses_minimal_event() {
        let body = br#"{"id":"evt_1","type":"invoice.paid","data":{"object":{}}}"#;
        let event = PaymentEvent::from_slice(body).unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.parsed_type(), PaymentEventType::Other);
        assert_eq!(event.created, None);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let result = PaymentEvent::from_slice(b"not json");
        assert!(matches!(result, Err(WebhookError::Malformed(_))));
    }

    #[test]
    fn recognizes_checkout_completed() {
        assert_eq!(
            PaymentEventType::from_str("checkout.session.completed"),
            PaymentEventType::CheckoutSessionCompleted
        );
    }

    #[test]
    fn extracts_completion_with_string_metadata() {
        let completion = CheckoutCompletion::from_event(&event(json!({
            "id": "cs_test_1",
            "payment_intent": "pi_1",
            "amount_total": 4900,
            "currency": "eur",
            "metadata": {
                "owner_id": "Host@Example.com",
                "product_type": "credits_100",
                "credits_amount": "100"
            }
        })))
        .unwrap();

        assert_eq!(completion.session_id, "cs_test_1");
        assert_eq!(completion.owner_id.as_str(), "host@example.com");
        assert_eq!(completion.product_type, "credits_100");
        assert_eq!(completion.credits_amount, 100);
        assert_eq!(completion.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(completion.amount_paid, Some(4900));
        assert_eq!(completion.currency.as_deref(), Some("eur"));
    }

    #[test]
    fn accepts_numeric_credits_and_expanded_intent() {
        let completion = CheckoutCompletion::from_event(&event(json!({
            "id": "cs_test_2",
            "payment_intent": { "id": "pi_2" },
            "metadata": {
                "owner_id": "host@example.com",
                "product_type": "credits_30",
                "credits_amount": 30
            }
        })))
        .unwrap();

        assert_eq!(completion.credits_amount, 30);
        assert_eq!(completion.payment_intent_id.as_deref(), Some("pi_2"));
    }

    #[test]
    fn missing_owner_is_reported() {
        let result = CheckoutCompletion::from_event(&event(json!({
            "id": "cs_test_3",
            "metadata": { "product_type": "credits_30", "credits_amount": "30" }
        })));
        assert!(matches!(result, Err(WebhookError::MissingMetadata("owner_id"))));
    }

    #[test]
    fn missing_metadata_object_is_reported() {
        let result = CheckoutCompletion::from_event(&event(json!({ "id": "cs_test_4" })));
        assert!(matches!(result, Err(WebhookError::MissingMetadata("owner_id"))));
    }

    #[test]
    fn non_numeric_credits_are_reported() {
        let result = CheckoutCompletion::from_event(&event(json!({
            "id": "cs_test_5",
            "metadata": {
                "owner_id": "host@example.com",
                "product_type": "credits_30",
                "credits_amount": "thirty"
            }
        })));
        assert!(matches!(result, Err(WebhookError::MissingMetadata("credits_amount"))));
    }

    #[test]
    fn zero_credits_are_reported() {
        let result = CheckoutCompletion::from_event(&event(json!({
            "id": "cs_test_6",
            "metadata": {
                "owner_id": "host@example.com",
                "product_type": "credits_0",
                "credits_amount": 0
            }
        })));
        assert!(matches!(result, Err(WebhookError::MissingMetadata("credits_amount"))));
    }

    #[test]
    fn missing_session_id_is_reported() {
        let result = CheckoutCompletion::from_event(&event(json!({
            "metadata": {
                "owner_id": "host@example.com",
                "product_type": "credits_30",
                "credits_amount": 30
            }
        })));
        assert!(matches!(result, Err(WebhookError::MissingMetadata("session_id"))));
    }
}
