//! Email delivery-status events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::foundation::{DeliveryEventId, Timestamp};
use crate::domain::webhook::WebhookError;

/// Delivery statuses the timeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryEventType {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Bounced,
    Complained,
    DeliveryDelayed,
}

impl DeliveryEventType {
    pub const ALL: [DeliveryEventType; 7] = [
        DeliveryEventType::Sent,
        DeliveryEventType::Delivered,
        DeliveryEventType::Opened,
        DeliveryEventType::Clicked,
        DeliveryEventType::Bounced,
        DeliveryEventType::Complained,
        DeliveryEventType::DeliveryDelayed,
    ];

    /// Accepts both bare (`clicked`) and provider-prefixed (`email.clicked`) names.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.strip_prefix("email.").unwrap_or(raw);
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryEventType::Sent => "sent",
            DeliveryEventType::Delivered => "delivered",
            DeliveryEventType::Opened => "opened",
            DeliveryEventType::Clicked => "clicked",
            DeliveryEventType::Bounced => "bounced",
            DeliveryEventType::Complained => "complained",
            DeliveryEventType::DeliveryDelayed => "delivery_delayed",
        }
    }
}

impl std::fmt::Display for DeliveryEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope posted by the email provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl DeliveryEnvelope {
    pub fn from_slice(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::Malformed(e.to_string()))
    }

    pub fn parsed_type(&self) -> Option<DeliveryEventType> {
        DeliveryEventType::parse(&self.event_type)
    }

    pub fn email_id(&self) -> Option<&str> {
        self.data
            .get("email_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// First recipient; `data.to` may be a string or an array.
    pub fn recipient(&self) -> Option<String> {
        match self.data.get("to")? {
            Value::String(to) => Some(to.clone()),
            Value::Array(list) => list.first().and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    /// Campaign id carried on the message tags.
    ///
    /// Tags arrive either as an object (`{"campaign_id": "C1"}`) or as a list
    /// of `{name, value}` pairs.
    pub fn tagged_campaign_id(&self) -> Option<String> {
        let tags = self.data.get("tags")?;
        let value = match tags {
            Value::Object(map) => map.get("campaign_id").cloned(),
            Value::Array(list) => list
                .iter()
                .find(|tag| tag.get("name").and_then(Value::as_str) == Some("campaign_id"))
                .and_then(|tag| tag.get("value").cloned()),
            _ => None,
        }?;
        match value {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Provider timestamp, when present and parseable.
    pub fn occurred_at(&self) -> Option<Timestamp> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
    }
}

/// Reshapes provider payloads into the fields the timeline displays.
///
/// Clicks, bounces and complaints get a flat shape. Other types keep the raw
/// `data` object.
pub fn normalize_event_data(event_type: DeliveryEventType, data: &Value) -> Value {
    let field = |section: &str, key: &str| -> Value {
        data.get(section)
            .and_then(|s| s.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    };

    match event_type {
        DeliveryEventType::Clicked => json!({
            "link": field("click", "link"),
            "timestamp": field("click", "timestamp"),
            "ip": field("click", "ipAddress"),
            "user_agent": field("click", "userAgent"),
        }),
        DeliveryEventType::Bounced => json!({
            "bounce_type": field("bounce", "type"),
            "reason": field("bounce", "message"),
        }),
        DeliveryEventType::Complained => json!({
            "feedback_type": field("complaint", "feedbackType"),
            "user_agent": field("complaint", "userAgent"),
        }),
        _ => match data {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        },
    }
}

/// Row in the append-only delivery timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryEvent {
    pub id: DeliveryEventId,
    pub campaign_id: Option<String>,
    pub email_id: String,
    pub recipient: Option<String>,
    pub event_type: DeliveryEventType,
    pub event_data: Value,
    pub created_at: Timestamp,
}

impl DeliveryEvent {
    pub fn new(
        email_id: impl Into<String>,
        event_type: DeliveryEventType,
        event_data: Value,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: DeliveryEventId::new(),
            campaign_id: None,
            email_id: email_id.into(),
            recipient: None,
            event_type,
            event_data,
            created_at,
        }
    }

    pub fn with_campaign(mut self, campaign_id: Option<String>) -> Self {
        self.campaign_id = campaign_id;
        self
    }

    pub fn with_recipient(mut self, recipient: Option<String>) -> Self {
        self.recipient = recipient;
        self
    }

    /// Same row, stripped of its campaign association.
    pub fn without_campaign(mut self) -> Self {
        self.campaign_id = None;
        self
    }
}
