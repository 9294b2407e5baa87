//! ProcessPaymentEventHandler - turns a verified payment confirmation into credits.
//!
//! Steps for `checkout.session.completed`:
//! 1. Extract owner, product and credit amount from the session metadata
//! 2. Skip sessions that already have a completed purchase record
//! 3. Record the purchase, grant the credits and reactivate the owner in one
//!    ledger transaction (the unique `session_id` settles races)
//!
//! Nothing from step 3 survives a failure or a dropped request, so the
//! provider's retry is processed in full.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{OwnerId, Timestamp};
use crate::domain::ledger::{EntryDetails, PurchaseOutcome, PurchaseRecord};
use crate::domain::payment::{CheckoutCompletion, PaymentEvent, PaymentEventType};
use crate::domain::webhook::WebhookError;
use crate::ports::{CreditLedger, PurchaseRepository};

/// Command carrying a verified, parsed payment event.
#[derive(Debug, Clone)]
pub struct ProcessPaymentEventCommand {
    pub event: PaymentEvent,
}

/// Result of processing a payment event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessPaymentEventResult {
    /// Credits were added for a new checkout session.
    CreditsGranted {
        session_id: String,
        owner_id: OwnerId,
        credits: i64,
        new_balance: i64,
        reactivated: bool,
    },
    /// Event type that does not move credits.
    Ignored { event_type: String },
}

/// Handler for payment provider events.
pub struct ProcessPaymentEventHandler {
    ledger: Arc<dyn CreditLedger>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl ProcessPaymentEventHandler {
    pub fn new(ledger: Arc<dyn CreditLedger>, purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { ledger, purchases }
    }

    /// Processes one event.
    ///
    /// # Errors
    ///
    /// - `MissingMetadata` when the session lacks owner, product or amount
    /// - `AlreadyProcessed` for a replayed or concurrently processed session
    /// - `StorageWriteFailure` when the ledger write fails; the provider should retry
    pub async fn handle(
        &self,
        cmd: ProcessPaymentEventCommand,
    ) -> Result<ProcessPaymentEventResult, WebhookError> {
        let event = cmd.event;
        match event.parsed_type() {
            PaymentEventType::CheckoutSessionCompleted => self.handle_checkout_completed(&event).await,
            PaymentEventType::Other => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Ignoring payment event type"
                );
                Ok(ProcessPaymentEventResult::Ignored {
                    event_type: event.event_type,
                })
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &PaymentEvent,
    ) -> Result<ProcessPaymentEventResult, WebhookError> {
        let completion = CheckoutCompletion::from_event(event).map_err(|e| {
            tracing::warn!(
                event_id = %event.id,
                session_id = event.session_id().unwrap_or("-"),
                error = %e,
                "Checkout session cannot be credited"
            );
            e
        })?;

        if let Some(existing) = self
            .purchases
            .find_by_session_id(&completion.session_id)
            .await?
        {
            if existing.is_completed() {
                tracing::info!(
                    event_id = %event.id,
                    session_id = %completion.session_id,
                    "Checkout session already processed"
                );
                return Err(WebhookError::AlreadyProcessed(completion.session_id));
            }
        }

        let record = PurchaseRecord::completed(
            completion.session_id.clone(),
            completion.owner_id.clone(),
            completion.product_type.clone(),
            completion.credits_amount,
            Timestamp::now(),
        )
        .with_payment(
            completion.payment_intent_id.clone(),
            completion.amount_paid,
            completion.currency.clone(),
        );

        let details = EntryDetails::new(format!("Credit purchase: {}", completion.product_type))
            .with_metadata(json!({
                "session_id": completion.session_id,
                "payment_intent_id": completion.payment_intent_id,
                "product_type": completion.product_type,
            }));

        let outcome = self
            .ledger
            .record_purchase(&record, details)
            .await
            .map_err(|e| {
                tracing::error!(
                    event_id = %event.id,
                    session_id = %completion.session_id,
                    owner_id = %completion.owner_id,
                    error = %e,
                    "Credit purchase failed"
                );
                WebhookError::StorageWriteFailure(e.to_string())
            })?;

        let (entry, reactivated) = match outcome {
            PurchaseOutcome::Credited { entry, reactivated } => (entry, reactivated),
            PurchaseOutcome::AlreadyProcessed => {
                tracing::info!(
                    event_id = %event.id,
                    session_id = %completion.session_id,
                    "Checkout session processed concurrently"
                );
                return Err(WebhookError::AlreadyProcessed(completion.session_id));
            }
        };

        tracing::info!(
            event_id = %event.id,
            session_id = %completion.session_id,
            owner_id = %completion.owner_id,
            credits = completion.credits_amount,
            new_balance = entry.new_balance,
            reactivated,
            "Credits granted"
        );

        Ok(ProcessPaymentEventResult::CreditsGranted {
            session_id: completion.session_id,
            owner_id: completion.owner_id,
            credits: completion.credits_amount,
            new_balance: entry.new_balance,
            reactivated,
        })
    }
}
