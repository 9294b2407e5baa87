//! DeliveryEventRepository port - append-only email delivery timeline.

use async_trait::async_trait;

use crate::domain::delivery::DeliveryEvent;
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait DeliveryEventRepository: Send + Sync {
    /// Campaign of the stored `sent` event for `email_id`, if any.
    async fn find_campaign_for_email(&self, email_id: &str) -> Result<Option<String>, DomainError>;

    /// Appends one event row. There is no dedup key.
    ///
    /// # Errors
    ///
    /// - `ForeignKeyViolation` if `campaign_id` references no campaign
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, event: &DeliveryEvent) -> Result<(), DomainError>;
}
