//! PostgreSQL implementation of PurchaseRepository.
//!
//! Rows are written by `PostgresCreditLedger::record_purchase` in the same
//! transaction as the grant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OwnerId, PurchaseId, Timestamp};
use crate::domain::ledger::{PurchaseRecord, PurchaseStatus};
use crate::ports::PurchaseRepository;

pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    session_id: String,
    payment_intent_id: Option<String>,
    owner_id: String,
    product_type: String,
    credits_amount: i64,
    amount_paid: Option<i64>,
    currency: Option<String>,
    status: String,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let invalid = |field: &str, e: crate::domain::foundation::ValidationError| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", field, e))
        };

        Ok(PurchaseRecord {
            id: PurchaseId::from_uuid(row.id),
            session_id: row.session_id,
            payment_intent_id: row.payment_intent_id,
            owner_id: OwnerId::new(row.owner_id).map_err(|e| invalid("owner_id", e))?,
            product_type: row.product_type,
            credits_amount: row.credits_amount,
            amount_paid: row.amount_paid,
            currency: row.currency,
            status: PurchaseStatus::parse(&row.status).map_err(|e| invalid("status", e))?,
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, payment_intent_id, owner_id, product_type, credits_amount,
                   amount_paid, currency, status, completed_at
            FROM credit_purchases
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load purchase: {}", e)))?;

        row.map(PurchaseRecord::try_from).transpose()
    }
}
