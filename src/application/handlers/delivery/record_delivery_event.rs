//! RecordDeliveryEventHandler - appends one delivery-status event to the timeline.

use std::sync::Arc;

use crate::domain::delivery::{
    normalize_event_data, DeliveryEnvelope, DeliveryEvent, DeliveryEventType,
};
use crate::domain::foundation::{DeliveryEventId, Timestamp};
use crate::domain::webhook::WebhookError;
use crate::ports::DeliveryEventRepository;

/// Command carrying a verified, parsed delivery envelope.
#[derive(Debug, Clone)]
pub struct RecordDeliveryEventCommand {
    pub envelope: DeliveryEnvelope,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDeliveryEventResult {
    pub event_id: DeliveryEventId,
    pub event_type: DeliveryEventType,
    pub campaign_id: Option<String>,
}

pub struct RecordDeliveryEventHandler {
    events: Arc<dyn DeliveryEventRepository>,
}

impl RecordDeliveryEventHandler {
    pub fn new(events: Arc<dyn DeliveryEventRepository>) -> Self {
        Self { events }
    }

    /// Records the event.
    ///
    /// An unknown campaign reference is not an error: the row is stored
    /// without it.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` for types outside the supported set
    /// - `MissingMetadata` when `data.email_id` is absent
    /// - `StorageWriteFailure` when the lookup or insert fails
    pub async fn handle(
        &self,
        cmd: RecordDeliveryEventCommand,
    ) -> Result<RecordDeliveryEventResult, WebhookError> {
        let envelope = cmd.envelope;

        let event_type = envelope.parsed_type().ok_or_else(|| {
            tracing::info!(event_type = %envelope.event_type, "Ignoring delivery event type");
            WebhookError::UnknownEventType(envelope.event_type.clone())
        })?;

        let email_id = envelope.email_id().ok_or_else(|| {
            tracing::warn!(event_type = %event_type, "Delivery event without email_id");
            WebhookError::MissingMetadata("email_id")
        })?;

        let campaign_id = match envelope.tagged_campaign_id() {
            Some(campaign_id) => Some(campaign_id),
            None => self.events.find_campaign_for_email(email_id).await?,
        };

        let event = DeliveryEvent::new(
            email_id,
            event_type,
            normalize_event_data(event_type, &envelope.data),
            envelope.occurred_at().unwrap_or_else(Timestamp::now),
        )
        .with_campaign(campaign_id)
        .with_recipient(envelope.recipient());

        let stored = match self.events.insert(&event).await.map_err(WebhookError::from) {
            Ok(()) => event,
            Err(WebhookError::UnresolvedReference(reason)) => {
                tracing::warn!(
                    email_id = %event.email_id,
                    campaign_id = event.campaign_id.as_deref().unwrap_or("-"),
                    reason = %reason,
                    "Campaign not found, storing event without it"
                );
                let event = event.without_campaign();
                self.events.insert(&event).await?;
                event
            }
            Err(e) => {
                tracing::error!(email_id = %event.email_id, error = %e, "Failed to record delivery event");
                return Err(e);
            }
        };

        tracing::debug!(
            email_id = %stored.email_id,
            event_type = %stored.event_type,
            campaign_id = stored.campaign_id.as_deref().unwrap_or("-"),
            "Delivery event recorded"
        );

        Ok(RecordDeliveryEventResult {
            event_id: stored.id,
            event_type: stored.event_type,
            campaign_id: stored.campaign_id,
        })
    }
}
