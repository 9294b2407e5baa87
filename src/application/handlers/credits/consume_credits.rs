//! ConsumeCreditsHandler - applies the decay schedule to every active owner.
//!
//! Each due owner loses `CREDITS_PER_INTERVAL` per sweep and its clock moves
//! forward by exactly one interval, so an owner several intervals behind is
//! charged once per sweep until caught up. The charge is conditional on the
//! `last_consumption_at` value the sweep read, so two overlapping sweeps
//! charge an interval once.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::ledger::{decay, CreditAccount, CREDITS_PER_INTERVAL};
use crate::ports::CreditLedger;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Candidates listed (active, positive balance).
    pub examined: usize,
    /// Owners charged one interval.
    pub consumed: usize,
    /// Charged owners whose balance reached zero.
    pub suspended: usize,
    /// Not yet due, clock never started, or already charged by another sweep.
    pub skipped: usize,
    /// Owners whose charge failed.
    pub failed: usize,
}

pub struct ConsumeCreditsHandler {
    ledger: Arc<dyn CreditLedger>,
}

impl ConsumeCreditsHandler {
    pub fn new(ledger: Arc<dyn CreditLedger>) -> Self {
        Self { ledger }
    }

    /// Runs one sweep as of `now`.
    ///
    /// Per-owner failures are logged and counted; only failing to list the
    /// candidates aborts the sweep.
    pub async fn run_sweep(&self, now: Timestamp) -> Result<SweepReport, DomainError> {
        let candidates = self.ledger.list_consumption_candidates().await?;
        let mut report = SweepReport {
            examined: candidates.len(),
            ..SweepReport::default()
        };

        for account in candidates {
            self.consume_if_due(&account, now, &mut report).await;
        }

        tracing::info!(
            examined = report.examined,
            consumed = report.consumed,
            suspended = report.suspended,
            skipped = report.skipped,
            failed = report.failed,
            "Decay sweep finished"
        );
        Ok(report)
    }

    async fn consume_if_due(&self, account: &CreditAccount, now: Timestamp, report: &mut SweepReport) {
        let Some(last) = account.last_consumption_at else {
            report.skipped += 1;
            return;
        };
        if !decay::should_consume_at(last, account.workspace_count, now) {
            report.skipped += 1;
            return;
        }

        let interval_end = last.plus(decay::interval(account.workspace_count));
        match self
            .ledger
            .consume_interval(
                &account.owner_id,
                Some(last),
                interval_end,
                now,
                CREDITS_PER_INTERVAL,
            )
            .await
        {
            Ok(Some(outcome)) => {
                report.consumed += 1;
                if outcome.suspended {
                    report.suspended += 1;
                    tracing::info!(owner_id = %account.owner_id, "Owner suspended: credits exhausted");
                }
            }
            Ok(None) => {
                report.skipped += 1;
                tracing::debug!(owner_id = %account.owner_id, "Interval already consumed");
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(owner_id = %account.owner_id, error = %e, "Credit consumption failed");
            }
        }
    }
}
