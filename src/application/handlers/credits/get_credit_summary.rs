//! GetCreditSummaryHandler - read-only view of an owner's credits.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode, OwnerId, Timestamp};
use crate::domain::ledger::{AccountStatus, CreditStatusLevel};
use crate::ports::CreditLedger;

#[derive(Debug, Clone)]
pub struct GetCreditSummaryQuery {
    pub owner_id: OwnerId,
}

/// Balance plus the decay projection for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditSummary {
    pub owner_id: OwnerId,
    pub credits_balance: i64,
    pub lifetime_earned: i64,
    pub workspace_count: u32,
    pub interval_hours: f64,
    pub days_remaining: i64,
    pub status_level: CreditStatusLevel,
    pub account_status: AccountStatus,
    pub suspended_at: Option<Timestamp>,
}

pub struct GetCreditSummaryHandler {
    ledger: Arc<dyn CreditLedger>,
}

impl GetCreditSummaryHandler {
    pub fn new(ledger: Arc<dyn CreditLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, query: GetCreditSummaryQuery) -> Result<CreditSummary, DomainError> {
        let account = self
            .ledger
            .find_account(&query.owner_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OwnerNotFound,
                    format!("Owner not found: {}", query.owner_id),
                )
            })?;

        let projection = account.projection();
        Ok(CreditSummary {
            owner_id: account.owner_id,
            credits_balance: account.credits_balance,
            lifetime_earned: account.lifetime_earned,
            workspace_count: account.workspace_count,
            interval_hours: projection.interval_hours,
            days_remaining: projection.days_remaining,
            status_level: projection.status_level,
            account_status: account.status,
            suspended_at: account.suspended_at,
        })
    }
}
