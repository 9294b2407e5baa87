//! Credit transaction log entries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OwnerId, Timestamp, TransactionId, ValidationError};

/// Kind of balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credits added by a completed payment.
    Purchase,
    /// Credits removed by the decay schedule.
    Consumption,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Consumption => "consumption",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "purchase" => Ok(TransactionType::Purchase),
            "consumption" => Ok(TransactionType::Consumption),
            other => Err(ValidationError::invalid_format(
                "transaction_type",
                format!("unknown transaction type '{}'", other),
            )),
        }
    }
}

/// Immutable row in the append-only transaction log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditTransaction {
    pub id: TransactionId,
    pub owner_id: OwnerId,
    /// Positive for purchases, negative for consumption.
    pub amount: i64,
    pub balance_after: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// Caller-supplied context recorded with a ledger movement.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDetails {
    pub description: String,
    pub metadata: serde_json::Value,
}

impl EntryDetails {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Result of a grant.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub transaction: CreditTransaction,
    pub new_balance: i64,
}

/// Result of a debit.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitOutcome {
    /// Balance before the debit.
    pub previous_balance: i64,
    /// Balance after clamping at zero.
    pub new_balance: i64,
    /// Transaction row, absent when the balance was already zero.
    pub transaction: Option<CreditTransaction>,
    /// True if this debit moved the account to suspended.
    pub suspended: bool,
}

impl DebitOutcome {
    /// Credits actually removed, which can be less than requested.
    pub fn debited(&self) -> i64 {
        self.previous_balance - self.new_balance
    }
}

/// Result of recording a confirmed purchase.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    /// The session was claimed and its credits granted.
    Credited {
        entry: LedgerEntry,
        /// True if the grant moved the owner out of suspension.
        reactivated: bool,
    },
    /// A completed record for the session already exists; nothing changed.
    AlreadyProcessed,
}

/// Validates that a ledger amount is strictly positive.
pub fn require_positive(field: &str, amount: i64) -> Result<i64, ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::not_positive(field, amount));
    }
    Ok(amount)
}

/// Clamped balance after removing `amount`.
pub fn clamp_debit(balance: i64, amount: i64) -> i64 {
    balance.saturating_sub(amount).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_round_trips() {
        for t in [TransactionType::Purchase, TransactionType::Consumption] {
            assert_eq!(TransactionType::parse(t.as_str()).unwrap(), t);
        }
        assert!(TransactionType::parse("refund").is_err());
    }

    #[test]
    fn clamp_debit_never_goes_negative() {
        assert_eq!(clamp_debit(10, 3), 7);
        assert_eq!(clamp_debit(2, 5), 0);
        assert_eq!(clamp_debit(0, 1), 0);
        assert_eq!(clamp_debit(i64::MIN + 1, i64::MAX), 0);
    }

    #[test]
    fn require_positive_rejects_zero_and_negative() {
        assert!(require_positive("amount", 0).is_err());
        assert!(require_positive("amount", -1).is_err());
        assert_eq!(require_positive("amount", 5).unwrap(), 5);
    }

    #[test]
    fn debit_outcome_reports_actual_amount() {
        let outcome = DebitOutcome {
            previous_balance: 2,
            new_balance: 0,
            transaction: None,
            suspended: true,
        };
        assert_eq!(outcome.debited(), 2);
    }

    #[test]
    fn entry_details_default_metadata_is_empty_object() {
        let details = EntryDetails::new("Credit purchase");
        assert_eq!(details.metadata, serde_json::json!({}));
    }
}
