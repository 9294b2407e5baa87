//! DecaySweeper - Background service that runs the credit decay sweep.
//!
//! Each tick calls `ConsumeCreditsHandler::run_sweep`. The sweep is safe to
//! overlap with another instance or an external cron driving the same
//! handler, so several replicas may run it.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `sweep_interval` | 15 min | How often to look for due owners |
//!
//! ## Graceful Shutdown
//!
//! The loop exits when the shutdown channel flips to `true` or its sender is
//! dropped. A sweep in progress finishes first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::application::{ConsumeCreditsHandler, SweepReport};
use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone)]
pub struct DecaySweeperConfig {
    pub sweep_interval: Duration,
}

impl Default for DecaySweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl DecaySweeperConfig {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

pub struct DecaySweeper {
    handler: Arc<ConsumeCreditsHandler>,
    config: DecaySweeperConfig,
}

impl DecaySweeper {
    pub fn new(handler: Arc<ConsumeCreditsHandler>, config: DecaySweeperConfig) -> Self {
        Self { handler, config }
    }

    /// Runs sweeps until shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            "Decay sweeper started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Decay sweeper stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// Runs one sweep; failures are logged and the loop carries on.
    pub async fn sweep_once(&self) -> Option<SweepReport> {
        match self.handler.run_sweep(Timestamp::now()).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Decay sweep failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::domain::foundation::OwnerId;
    use crate::domain::ledger::CreditAccount;
    use crate::ports::CreditLedger;

    async fn ledger_with_due_owner() -> Arc<InMemoryLedger> {
        let ledger = Arc::new(InMemoryLedger::new());
        let mut account = CreditAccount::new(OwnerId::new("host@example.com").unwrap());
        account.credits_balance = 5;
        account.last_consumption_at = Some(Timestamp::now().minus_hours(30));
        ledger.seed_account(account).await;
        ledger
    }

    #[tokio::test]
    async fn sweep_once_reports_consumption() {
        let ledger = ledger_with_due_owner().await;
        let sweeper = DecaySweeper::new(
            Arc::new(ConsumeCreditsHandler::new(ledger.clone())),
            DecaySweeperConfig::default(),
        );

        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.consumed, 1);
    }

    #[tokio::test]
    async fn run_sweeps_then_stops_on_shutdown() {
        let ledger = ledger_with_due_owner().await;
        let config = DecaySweeperConfig::default().with_sweep_interval(Duration::from_millis(10));
        let sweeper = DecaySweeper::new(Arc::new(ConsumeCreditsHandler::new(ledger.clone())), config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "sweeper should stop after shutdown");

        let owner = OwnerId::new("host@example.com").unwrap();
        let account = ledger.find_account(&owner).await.unwrap().unwrap();
        // First tick fires immediately; later ticks find the interval not yet due.
        assert_eq!(account.credits_balance, 4);
    }

    #[tokio::test]
    async fn run_stops_when_sender_dropped() {
        let ledger = Arc::new(InMemoryLedger::new());
        let sweeper = DecaySweeper::new(
            Arc::new(ConsumeCreditsHandler::new(ledger)),
            DecaySweeperConfig::default(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);

        let result = tokio::time::timeout(Duration::from_secs(1), sweeper.run(shutdown_rx)).await;

        assert!(result.is_ok());
    }
}
