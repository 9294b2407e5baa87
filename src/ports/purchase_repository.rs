//! PurchaseRepository port - read side of the payment idempotency anchor.
//!
//! Providers deliver the same confirmation more than once. Purchase rows are
//! written by [`CreditLedger::record_purchase`](super::CreditLedger::record_purchase)
//! together with the grant; this port only looks them up.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::ledger::PurchaseRecord;

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Finds the purchase for a checkout session, pending or completed.
    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError>;
}
