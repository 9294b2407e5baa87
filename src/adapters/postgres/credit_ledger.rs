//! PostgreSQL implementation of CreditLedger.
//!
//! Balance changes are SQL increments inside one transaction together with the
//! transaction-log append. Debits lock the owner row first so the amount
//! actually removed can be recorded exactly. A purchase claims its
//! `credit_purchases` row, grants and reactivates in a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, OwnerId, Timestamp, TransactionId};
use crate::domain::ledger::{
    require_positive, AccountStatus, CreditAccount, CreditTransaction, DebitOutcome, EntryDetails,
    LedgerEntry, PurchaseOutcome, PurchaseRecord, PurchaseStatus, TransactionType,
};
use crate::ports::CreditLedger;

/// PostgreSQL implementation of the CreditLedger port.
pub struct PostgresCreditLedger {
    pool: PgPool,
}

impl PostgresCreditLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Owner row joined with its workspace count.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    owner_id: String,
    credits_balance: i64,
    lifetime_earned: i64,
    account_status: String,
    suspended_at: Option<DateTime<Utc>>,
    last_consumption_at: Option<DateTime<Utc>>,
    workspace_count: i64,
}

impl TryFrom<AccountRow> for CreditAccount {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let owner_id = OwnerId::new(row.owner_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner_id: {}", e))
        })?;
        let status = AccountStatus::parse(&row.account_status).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid account_status: {}", e))
        })?;

        Ok(CreditAccount {
            owner_id,
            credits_balance: row.credits_balance,
            lifetime_earned: row.lifetime_earned,
            status,
            suspended_at: row.suspended_at.map(Timestamp::from_datetime),
            last_consumption_at: row.last_consumption_at.map(Timestamp::from_datetime),
            workspace_count: u32::try_from(row.workspace_count).unwrap_or(u32::MAX),
        })
    }
}

const ACCOUNT_SELECT: &str = r#"
    SELECT
        o.owner_id,
        o.credits_balance,
        o.lifetime_earned,
        o.account_status,
        o.suspended_at,
        o.last_consumption_at,
        (SELECT COUNT(*) FROM workspaces w WHERE w.owner_id = o.owner_id) AS workspace_count
    FROM owners o
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

/// Row values read under `FOR UPDATE` before a debit.
struct LockedBalance {
    credits_balance: i64,
    last_consumption_at: Option<DateTime<Utc>>,
}

async fn lock_owner(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: &OwnerId,
) -> Result<Option<LockedBalance>, DomainError> {
    let row: Option<(i64, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT credits_balance, last_consumption_at FROM owners WHERE owner_id = $1 FOR UPDATE",
    )
    .bind(owner_id.as_str())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to lock owner", e))?;

    Ok(row.map(|(credits_balance, last_consumption_at)| LockedBalance {
        credits_balance,
        last_consumption_at,
    }))
}

async fn append_transaction(
    tx: &mut Transaction<'_, Postgres>,
    transaction: &CreditTransaction,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO credit_transactions (
            id, owner_id, amount, balance_after, transaction_type, description, metadata, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(transaction.id.as_uuid())
    .bind(transaction.owner_id.as_str())
    .bind(transaction.amount)
    .bind(transaction.balance_after)
    .bind(transaction.transaction_type.as_str())
    .bind(&transaction.description)
    .bind(&transaction.metadata)
    .bind(transaction.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to append credit transaction", e))?;

    Ok(())
}

/// Decrements a locked owner row, logs the movement and suspends at zero.
///
/// When `advance_clock` is set, `last_consumption_at` moves to it in the same
/// update.
async fn apply_debit(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: &OwnerId,
    previous_balance: i64,
    amount: i64,
    details: EntryDetails,
    now: Timestamp,
    advance_clock: Option<Timestamp>,
) -> Result<DebitOutcome, DomainError> {
    let (new_balance,): (i64,) = sqlx::query_as(
        r#"
        UPDATE owners SET
            credits_balance = GREATEST(credits_balance - $2, 0),
            last_consumption_at = COALESCE($3, last_consumption_at),
            updated_at = $4
        WHERE owner_id = $1
        RETURNING credits_balance
        "#,
    )
    .bind(owner_id.as_str())
    .bind(amount)
    .bind(advance_clock.map(|t| *t.as_datetime()))
    .bind(now.as_datetime())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to debit credits", e))?;

    let removed = previous_balance - new_balance;
    let transaction = if removed > 0 {
        let transaction = CreditTransaction {
            id: TransactionId::new(),
            owner_id: owner_id.clone(),
            amount: -removed,
            balance_after: new_balance,
            transaction_type: TransactionType::Consumption,
            description: details.description,
            metadata: details.metadata,
            created_at: now,
        };
        append_transaction(tx, &transaction).await?;
        Some(transaction)
    } else {
        None
    };

    let suspended = if new_balance == 0 {
        sqlx::query(
            r#"
            UPDATE owners SET account_status = 'suspended', suspended_at = $2, updated_at = $2
            WHERE owner_id = $1 AND account_status = 'active'
            "#,
        )
        .bind(owner_id.as_str())
        .bind(now.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("Failed to suspend owner", e))?
        .rows_affected()
            > 0
    } else {
        false
    };

    Ok(DebitOutcome {
        previous_balance,
        new_balance,
        transaction,
        suspended,
    })
}

/// Increments (or creates) the owner row and appends a `purchase` transaction.
async fn credit_owner(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: &OwnerId,
    amount: i64,
    details: EntryDetails,
    now: Timestamp,
) -> Result<LedgerEntry, DomainError> {
    let (new_balance,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO owners (
            owner_id, credits_balance, lifetime_earned, last_consumption_at, created_at, updated_at
        ) VALUES ($1, $2, $2, $3, $3, $3)
        ON CONFLICT (owner_id) DO UPDATE SET
            credits_balance = owners.credits_balance + EXCLUDED.credits_balance,
            lifetime_earned = owners.lifetime_earned + EXCLUDED.lifetime_earned,
            last_consumption_at = COALESCE(owners.last_consumption_at, EXCLUDED.last_consumption_at),
            updated_at = EXCLUDED.updated_at
        RETURNING credits_balance
        "#,
    )
    .bind(owner_id.as_str())
    .bind(amount)
    .bind(now.as_datetime())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to grant credits", e))?;

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
    append_transaction(tx, &transaction).await?;

    Ok(LedgerEntry {
        transaction,
        new_balance,
    })
}

/// Inserts the purchase as completed or upgrades a pending row.
///
/// Returns false when the session is already completed. A concurrent claim
/// for the same session blocks on the unique index until the other
/// transaction finishes, then sees its outcome.
async fn claim_purchase(
    tx: &mut Transaction<'_, Postgres>,
    record: &PurchaseRecord,
    now: Timestamp,
) -> Result<bool, DomainError> {
    let completed_at = record.completed_at.unwrap_or(now);
    let result = sqlx::query(
        r#"
        INSERT INTO credit_purchases (
            id, session_id, payment_intent_id, owner_id, product_type, credits_amount,
            amount_paid, currency, status, completed_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (session_id) DO UPDATE SET
            payment_intent_id = COALESCE(EXCLUDED.payment_intent_id, credit_purchases.payment_intent_id),
            owner_id = EXCLUDED.owner_id,
            product_type = EXCLUDED.product_type,
            credits_amount = EXCLUDED.credits_amount,
            amount_paid = COALESCE(EXCLUDED.amount_paid, credit_purchases.amount_paid),
            currency = COALESCE(EXCLUDED.currency, credit_purchases.currency),
            status = EXCLUDED.status,
            completed_at = EXCLUDED.completed_at
        WHERE credit_purchases.status = 'pending'
        "#,
    )
    .bind(record.id.as_uuid())
    .bind(&record.session_id)
    .bind(&record.payment_intent_id)
    .bind(record.owner_id.as_str())
    .bind(&record.product_type)
    .bind(record.credits_amount)
    .bind(record.amount_paid)
    .bind(&record.currency)
    .bind(PurchaseStatus::Completed.as_str())
    .bind(completed_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to save purchase", e))?;

    Ok(result.rows_affected() > 0)
}

/// Suspended -> Active, restarting the decay clock. False if already active.
async fn reactivate_owner(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: &OwnerId,
    now: Timestamp,
) -> Result<bool, DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE owners SET
            account_status = 'active',
            suspended_at = NULL,
            last_consumption_at = $2,
            updated_at = $2
        WHERE owner_id = $1 AND account_status = 'suspended'
        "#,
    )
    .bind(owner_id.as_str())
    .bind(now.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to reactivate owner", e))?;

    Ok(result.rows_affected() > 0)
}

fn owner_not_found(owner_id: &OwnerId) -> DomainError {
    DomainError::new(
        ErrorCode::OwnerNotFound,
        format!("Owner not found: {}", owner_id),
    )
}

#[async_trait]
impl CreditLedger for PostgresCreditLedger {
    async fn grant(
        &self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
    ) -> Result<LedgerEntry, DomainError> {
        let amount = require_positive("amount", amount)?;
        let now = Timestamp::now();

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })?;

        let entry = credit_owner(&mut tx, owner_id, amount, details, now).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit grant", e))?;

        Ok(entry)
    }

    async fn record_purchase(
        &self,
        record: &PurchaseRecord,
        details: EntryDetails,
    ) -> Result<PurchaseOutcome, DomainError> {
        let amount = require_positive("credits_amount", record.credits_amount)?;
        let now = Timestamp::now();

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })?;

        if !claim_purchase(&mut tx, record, now).await? {
            return Ok(PurchaseOutcome::AlreadyProcessed);
        }
        let entry = credit_owner(&mut tx, &record.owner_id, amount, details, now).await?;
        let reactivated = reactivate_owner(&mut tx, &record.owner_id, now).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit purchase", e))?;

        Ok(PurchaseOutcome::Credited { entry, reactivated })
    }

    async fn debit(
        &self,
        owner_id: &OwnerId,
        amount: i64,
        details: EntryDetails,
    ) -> Result<DebitOutcome, DomainError> {
        let amount = require_positive("amount", amount)?;
        let now = Timestamp::now();

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })?;

        let locked = lock_owner(&mut tx, owner_id)
            .await?
            .ok_or_else(|| owner_not_found(owner_id))?;

        let outcome = apply_debit(
            &mut tx,
            owner_id,
            locked.credits_balance,
            amount,
            details,
            now,
            None,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit debit", e))?;

        Ok(outcome)
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

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })?;

        let locked = match lock_owner(&mut tx, owner_id).await? {
            Some(locked) => locked,
            None => return Err(owner_not_found(owner_id)),
        };

        let expected = expected_last_consumption.map(|t| *t.as_datetime());
        if locked.last_consumption_at != expected {
            // Another sweep charged this interval; dropping tx rolls back.
            return Ok(None);
        }

        let details = EntryDetails::new("Credit consumption").with_metadata(serde_json::json!({
            "interval_end": interval_end.as_datetime().to_rfc3339(),
        }));
        let outcome = apply_debit(
            &mut tx,
            owner_id,
            locked.credits_balance,
            amount,
            details,
            now,
            Some(interval_end),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit consumption", e))?;

        Ok(Some(outcome))
    }

    async fn find_account(&self, owner_id: &OwnerId) -> Result<Option<CreditAccount>, DomainError> {
        let query = format!("{} WHERE o.owner_id = $1", ACCOUNT_SELECT);
        let row: Option<AccountRow> = sqlx::query_as(&query)
            .bind(owner_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load owner", e))?;

        row.map(CreditAccount::try_from).transpose()
    }

    async fn list_consumption_candidates(&self) -> Result<Vec<CreditAccount>, DomainError> {
        let query = format!(
            "{} WHERE o.account_status = 'active' AND o.credits_balance > 0 ORDER BY o.owner_id",
            ACCOUNT_SELECT
        );
        let rows: Vec<AccountRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list consumption candidates", e))?;

        rows.into_iter().map(CreditAccount::try_from).collect()
    }
}
