//! In-memory delivery timeline.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::delivery::{DeliveryEvent, DeliveryEventType};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::DeliveryEventRepository;

/// Append-only event list.
///
/// When campaigns are registered, inserts referencing any other campaign fail
/// with `ForeignKeyViolation`, like the `email_events.campaign_id` constraint.
#[derive(Default)]
pub struct InMemoryDeliveryEvents {
    events: RwLock<Vec<DeliveryEvent>>,
    campaigns: Option<HashSet<String>>,
}

impl InMemoryDeliveryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforces campaign references against a fixed set of known campaigns.
    pub fn with_campaigns<I, S>(campaigns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: RwLock::new(Vec::new()),
            campaigns: Some(campaigns.into_iter().map(Into::into).collect()),
        }
    }

    // === Test Helpers ===

    pub async fn events(&self) -> Vec<DeliveryEvent> {
        self.events.read().await.clone()
    }

    pub async fn events_for(&self, email_id: &str) -> Vec<DeliveryEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.email_id == email_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeliveryEventRepository for InMemoryDeliveryEvents {
    async fn find_campaign_for_email(&self, email_id: &str) -> Result<Option<String>, DomainError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.email_id == email_id && e.event_type == DeliveryEventType::Sent)
            .find_map(|e| e.campaign_id.clone()))
    }

    async fn insert(&self, event: &DeliveryEvent) -> Result<(), DomainError> {
        if let (Some(known), Some(campaign_id)) = (&self.campaigns, &event.campaign_id) {
            if !known.contains(campaign_id) {
                return Err(DomainError::new(
                    ErrorCode::ForeignKeyViolation,
                    format!("Unknown campaign reference: {}", campaign_id),
                ));
            }
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
