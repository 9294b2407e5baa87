//! In-memory ledger implementing the ledger and purchase ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OwnerId, Timestamp, TransactionId};
use crate::domain::ledger::{
    clamp_debit, require_positive, AccountStatus, CreditAccount, CreditTransaction, DebitOutcome,
    EntryDetails, LedgerEntry, PurchaseOutcome, PurchaseRecord, PurchaseStatus, TransactionType,
};
use crate::ports::{CreditLedger, PurchaseRepository};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<OwnerId, CreditAccount>,
    transactions: Vec<CreditTransaction>,
    purchases: HashMap<String, PurchaseRecord>,
}

impl LedgerState {
    fn account_mut(&mut self, owner_id: &OwnerId) -> Result<&mut CreditAccount, DomainError> {
        self.accounts.get_mut(owner_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::OwnerNotFound,
                format!("Owner not found: {}", owner_id),
            )
        })
    }

    fn credit(
        &mut self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
        now: Timestamp,
    ) -> LedgerEntry {
        let account = self
            .accounts
            .entry(owner_id.clone())
            .or_insert_with(|| CreditAccount::new(owner_id.clone()));
        account.credits_balance += amount;
        account.lifetime_earned += amount;
        account.last_consumption_at.get_or_insert(now);
        let new_balance = account.credits_balance;

        let transaction = CreditTransaction {
            id: TransactionId::new(),
            owner_id: owner_id.clone(),
            amount,
            balance_after: new_balance,
            transaction_type: TransactionType::Purchase,
            description: details.description,
            metadata: details.metadata,
            created_at: now,
        };
        self.transactions.push(transaction.clone());

        LedgerEntry {
            transaction,
            new_balance,
        }
    }

    fn debit(
        &mut self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
        now: Timestamp,
    ) -> Result<DebitOutcome, DomainError> {
        let account = self.account_mut(owner_id)?;
        let previous_balance = account.credits_balance;
        account.credits_balance = clamp_debit(previous_balance, amount);
        let new_balance = account.credits_balance;
        let suspended = account.suspend_if_empty(now);

        let transaction = (previous_balance > new_balance).then(|| CreditTransaction {
            id: TransactionId::new(),
            owner_id: owner_id.clone(),
            amount: new_balance - previous_balance,
            balance_after: new_balance,
            transaction_type: TransactionType::Consumption,
            description: details.description,
            metadata: details.metadata,
            created_at: now,
        });
        if let Some(transaction) = &transaction {
            self.transactions.push(transaction.clone());
        }

        Ok(DebitOutcome {
            previous_balance,
            new_balance,
            transaction,
            suspended,
        })
    }
}

/// Ledger, account state and purchase records behind a single lock.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    fail_grants: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Inserts or replaces an account.
    pub async fn seed_account(&self, account: CreditAccount) {
        let mut state = self.state.write().await;
        state.accounts.insert(account.owner_id.clone(), account);
    }

    /// Inserts or replaces a purchase record, e.g. a pending checkout.
    pub async fn seed_purchase(&self, record: PurchaseRecord) {
        let mut state = self.state.write().await;
        state.purchases.insert(record.session_id.clone(), record);
    }

    /// Makes every subsequent grant and purchase fail with a storage error.
    pub fn set_fail_grants(&self, fail: bool) {
        self.fail_grants.store(fail, Ordering::SeqCst);
    }

    /// All transactions for an owner, oldest first.
    pub async fn transactions_for(&self, owner_id: &OwnerId) -> Vec<CreditTransaction> {
        let state = self.state.read().await;
        state
            .transactions
            .iter()
            .filter(|t| &t.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub async fn purchase_count(&self) -> usize {
        self.state.read().await.purchases.len()
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn grant(
        &self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
    ) -> Result<LedgerEntry, DomainError> {
        let amount = require_positive("amount", amount)?;
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(DomainError::database("Simulated grant failure"));
        }

        let mut state = self.state.write().await;
        Ok(state.credit(owner_id, amount, details, Timestamp::now()))
    }

    async fn record_purchase(
        &self,
        record: &PurchaseRecord,
        details: EntryDetails,
    ) -> Result<PurchaseOutcome, DomainError> {
        let amount = require_positive("credits_amount", record.credits_amount)?;
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(DomainError::database("Simulated grant failure"));
        }

        let now = Timestamp::now();
        let mut state = self.state.write().await;
        if state
            .purchases
            .get(&record.session_id)
            .is_some_and(PurchaseRecord::is_completed)
        {
            return Ok(PurchaseOutcome::AlreadyProcessed);
        }

        let entry = state.credit(&record.owner_id, amount, details, now);
        let reactivated = state
            .accounts
            .get_mut(&record.owner_id)
            .is_some_and(|account| account.reactivate(now));
        let completed = PurchaseRecord {
            status: PurchaseStatus::Completed,
            completed_at: Some(record.completed_at.unwrap_or(now)),
            ..record.clone()
        };
        state.purchases.insert(completed.session_id.clone(), completed);

        Ok(PurchaseOutcome::Credited { entry, reactivated })
    }

    async fn debit(
        &self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
    ) -> Result<DebitOutcome, DomainError> {
        let amount = require_positive("amount", amount)?;
        let mut state = self.state.write().await;
        state.debit(owner_id, amount, details, Timestamp::now())
    }

    async fn consume_interval(
        &self,
        owner_id: &OwnerId,
        expected_last_consumption: Option<Timestamp>,
        interval_end: Timestamp,
        now: Timestamp,
        amount: i64,
    ) -> Result<Option<DebitOutcome>, DomainError> {
        let amount = require_positive("amount", amount)?;
        let mut state = self.state.write().await;

        let account = state.account_mut(owner_id)?;
        if account.last_consumption_at != expected_last_consumption {
            return Ok(None);
        }
        account.last_consumption_at = Some(interval_end);

        let details = EntryDetails::new("Credit consumption").with_metadata(serde_json::json!({
            "interval_end": interval_end.as_datetime().to_rfc3339(),
        }));
        state.debit(owner_id, amount, details, now).map(Some)
    }

    async fn find_account(&self, owner_id: &OwnerId) -> Result<Option<CreditAccount>, DomainError> {
        Ok(self.state.read().await.accounts.get(owner_id).cloned())
    }

    async fn list_consumption_candidates(&self) -> Result<Vec<CreditAccount>, DomainError> {
        let state = self.state.read().await;
        let mut candidates: Vec<CreditAccount> = state
            .accounts
            .values()
            .filter(|a| a.status == AccountStatus::Active && a.credits_balance > 0)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.owner_id.as_str().cmp(b.owner_id.as_str()));
        Ok(candidates)
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryLedger {
    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        Ok(self.state.read().await.purchases.get(session_id).cloned())
    }
}
