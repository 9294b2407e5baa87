//! PostgreSQL implementation of DeliveryEventRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::delivery::{DeliveryEvent, DeliveryEventType};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::DeliveryEventRepository;

/// SQLSTATE for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct PostgresDeliveryEventRepository {
    pool: PgPool,
}

impl PostgresDeliveryEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryEventRepository for PostgresDeliveryEventRepository {
    async fn find_campaign_for_email(&self, email_id: &str) -> Result<Option<String>, DomainError> {
        let campaign: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT campaign_id FROM email_events
            WHERE email_id = $1 AND event_type = $2 AND campaign_id IS NOT NULL
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(email_id)
        .bind(DeliveryEventType::Sent.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to resolve campaign: {}", e)))?;

        Ok(campaign.flatten())
    }

    async fn insert(&self, event: &DeliveryEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO email_events (
                id, campaign_id, email_id, recipient, event_type, event_data, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.campaign_id)
        .bind(&event.email_id)
        .bind(&event.recipient)
        .bind(event.event_type.as_str())
        .bind(&event.event_data)
        .bind(event.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    return DomainError::new(
                        ErrorCode::ForeignKeyViolation,
                        format!("Unknown campaign reference: {}", db_err.message()),
                    );
                }
            }
            DomainError::database(format!("Failed to insert delivery event: {}", e))
        })?;

        Ok(())
    }
}
