//! Account status state machine and the owner's ledger row.

use serde::{Deserialize, Serialize};

use super::decay::DecayProjection;
use crate::domain::foundation::{
    OwnerId, StateMachine, Timestamp, TransitionOutcome, ValidationError,
};

/// Whether an owner's guides are being served.
///
/// ```text
///            debit leaves balance at 0
///   Active ───────────────────────────▶ Suspended
///     ▲                                    │
///     └──────────── any grant ─────────────┘
/// ```
///
/// Requests for the current state are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
        }
    }

    /// Parses the stored column value.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "suspended" => Ok(AccountStatus::Suspended),
            other => Err(ValidationError::invalid_format(
                "account_status",
                format!("unknown status '{}'", other),
            )),
        }
    }

    /// Status after a debit leaves `balance_after` credits.
    pub fn after_debit(&self, balance_after: i64) -> Self {
        if balance_after == 0 {
            AccountStatus::Suspended
        } else {
            *self
        }
    }

    /// Status after any successful grant.
    pub fn after_grant(&self) -> Self {
        AccountStatus::Active
    }
}

impl StateMachine for AccountStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AccountStatus::*;
        matches!((self, target), (Active, Suspended) | (Suspended, Active))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AccountStatus::*;
        match self {
            Active => vec![Suspended],
            Suspended => vec![Active],
        }
    }
}

/// One owner's balance row. The single source of truth for credits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditAccount {
    pub owner_id: OwnerId,
    pub credits_balance: i64,
    pub lifetime_earned: i64,
    pub status: AccountStatus,
    pub suspended_at: Option<Timestamp>,
    pub last_consumption_at: Option<Timestamp>,
    pub workspace_count: u32,
}

impl CreditAccount {
    /// A fresh, empty, active account.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            credits_balance: 0,
            lifetime_earned: 0,
            status: AccountStatus::Active,
            suspended_at: None,
            last_consumption_at: None,
            workspace_count: 0,
        }
    }

    /// Applies the status change a grant causes.
    ///
    /// Returns true if the account was suspended and is now active. The decay
    /// clock restarts at `now` on reactivation so the owner is not charged
    /// for the time spent suspended.
    pub fn reactivate(&mut self, now: Timestamp) -> bool {
        let Ok(TransitionOutcome::Changed(next)) = self.status.apply(self.status.after_grant())
        else {
            return false;
        };
        self.status = next;
        self.suspended_at = None;
        self.last_consumption_at = Some(now);
        true
    }

    /// Applies the status change a debit causes. Returns true if it suspended.
    pub fn suspend_if_empty(&mut self, now: Timestamp) -> bool {
        let Ok(TransitionOutcome::Changed(next)) =
            self.status.apply(self.status.after_debit(self.credits_balance))
        else {
            return false;
        };
        self.status = next;
        self.suspended_at = Some(now);
        true
    }

    pub fn projection(&self) -> DecayProjection {
        DecayProjection::for_balance(self.credits_balance, self.workspace_count)
    }
}
