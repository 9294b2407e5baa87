//! Purchase records: the idempotency anchor for payment confirmations.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OwnerId, PurchaseId, Timestamp, ValidationError};

/// Lifecycle of a purchase record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Completed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            other => Err(ValidationError::invalid_format(
                "purchase_status",
                format!("unknown purchase status '{}'", other),
            )),
        }
    }
}

/// One payment confirmation, unique by checkout `session_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub owner_id: OwnerId,
    pub product_type: String,
    pub credits_amount: i64,
    /// Smallest currency unit (cents).
    pub amount_paid: Option<i64>,
    pub currency: Option<String>,
    pub status: PurchaseStatus,
    pub completed_at: Option<Timestamp>,
}

impl PurchaseRecord {
    /// Builds a record for a confirmed payment.
    pub fn completed(
        session_id: impl Into<String>,
        owner_id: OwnerId,
        product_type: impl Into<String>,
        credits_amount: i64,
        completed_at: Timestamp,
    ) -> Self {
        Self {
            id: PurchaseId::new(),
            session_id: session_id.into(),
            payment_intent_id: None,
            owner_id,
            product_type: product_type.into(),
            credits_amount,
            amount_paid: None,
            currency: None,
            status: PurchaseStatus::Completed,
            completed_at: Some(completed_at),
        }
    }

    pub fn with_payment(
        mut self,
        payment_intent_id: Option<String>,
        amount_paid: Option<i64>,
        currency: Option<String>,
    ) -> Self {
        self.payment_intent_id = payment_intent_id;
        self.amount_paid = amount_paid;
        self.currency = currency;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == PurchaseStatus::Completed
    }
}
