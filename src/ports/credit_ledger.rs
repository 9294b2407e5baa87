//! CreditLedger port - atomic balance movements.
//!
//! Every operation is a single storage transaction: the balance update, the
//! transaction-log append and any status change commit together or not at
//! all. Implementations must update balances with in-storage arithmetic
//! (`credits_balance = credits_balance + $1`), never read-modify-write, so
//! concurrent calls compose.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OwnerId, Timestamp};
use crate::domain::ledger::{
    CreditAccount, DebitOutcome, EntryDetails, LedgerEntry, PurchaseOutcome, PurchaseRecord,
};

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Adds `amount` credits and appends a `purchase` transaction.
    ///
    /// Creates the owner row when missing and starts the decay clock if it
    /// was never started.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `DatabaseError` on persistence failure
    async fn grant(
        &self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
    ) -> Result<LedgerEntry, DomainError>;

    /// Claims a checkout session and credits it in one storage transaction.
    ///
    /// Inserts `record` as completed, or upgrades an existing `pending` row
    /// for the same `session_id`. When a completed row already exists nothing
    /// is written and `AlreadyProcessed` is returned. Otherwise the grant
    /// described by [`grant`](Self::grant) and the reactivation of a
    /// suspended owner (clock restarted at the grant time) commit together
    /// with the purchase row.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `record.credits_amount <= 0`
    /// - `DatabaseError` on persistence failure; nothing is written
    async fn record_purchase(
        &self,
        record: &PurchaseRecord,
        details: EntryDetails,
    ) -> Result<PurchaseOutcome, DomainError>;

    /// Removes up to `amount` credits, clamping the balance at zero.
    ///
    /// The appended `consumption` transaction records the amount actually
    /// removed and is skipped when nothing was removed. A debit that leaves
    /// the balance at zero suspends the account in the same transaction.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `OwnerNotFound` if the owner has no ledger row
    /// - `DatabaseError` on persistence failure
    async fn debit(
        &self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
    ) -> Result<DebitOutcome, DomainError>;

    /// Scheduler debit for one elapsed decay interval.
    ///
    /// Same as [`debit`](Self::debit) but only applies when the stored
    /// `last_consumption_at` still equals `expected_last_consumption`, and
    /// moves it to `interval_end` in the same update. The caller passes the
    /// end of the interval being charged, not the sweep time, so missed
    /// intervals are charged by later sweeps. Returns `None` when a
    /// concurrent sweep already charged this interval.
    async fn consume_interval(
        &self,
        owner_id: &OwnerId,
        expected_last_consumption: Option<Timestamp>,
        interval_end: Timestamp,
        now: Timestamp,
        amount: i64,
    ) -> Result<Option<DebitOutcome>, DomainError>;

    /// Loads one owner's ledger row with its workspace count.
    async fn find_account(&self, owner_id: &OwnerId) -> Result<Option<CreditAccount>, DomainError>;

    /// Active owners with a positive balance, for the decay sweep.
    async fn list_consumption_candidates(&self) -> Result<Vec<CreditAccount>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn CreditLedger) {}
    }
}
