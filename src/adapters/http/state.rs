//! Shared application state for HTTP handlers.

use std::sync::Arc;

use crate::application::{
    GetCreditSummaryHandler, ProcessPaymentEventHandler, RecordDeliveryEventHandler,
};
use crate::domain::webhook::WebhookVerifier;
use crate::ports::{CreditLedger, DeliveryEventRepository, PurchaseRepository};

/// Cloned for each request; dependencies are Arc-wrapped.
///
/// A `None` verifier means the source's signing secret is not configured and
/// every request to that endpoint fails with 500.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn CreditLedger>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub delivery_events: Arc<dyn DeliveryEventRepository>,
    pub payment_verifier: Option<Arc<dyn WebhookVerifier>>,
    pub delivery_verifier: Option<Arc<dyn WebhookVerifier>>,
}

impl AppState {
    pub fn process_payment_handler(&self) -> ProcessPaymentEventHandler {
        ProcessPaymentEventHandler::new(self.ledger.clone(), self.purchases.clone())
    }

    pub fn record_delivery_handler(&self) -> RecordDeliveryEventHandler {
        RecordDeliveryEventHandler::new(self.delivery_events.clone())
    }

    pub fn credit_summary_handler(&self) -> GetCreditSummaryHandler {
        GetCreditSummaryHandler::new(self.ledger.clone())
    }
}
