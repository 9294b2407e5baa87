//! Credit ledger domain.
//!
//! # Module Structure
//!
//! - `account` - Owner balance row and the active/suspended state machine
//! - `decay` - Pure decay calculator (interval, days remaining, status level)
//! - `purchase` - Purchase records keyed by checkout session
//! - `transaction` - Append-only credit transaction log entries

mod account;
pub mod decay;
mod purchase;
mod transaction;

pub use account::{AccountStatus, CreditAccount};
pub use decay::{CreditStatusLevel, DecayProjection, CREDITS_PER_INTERVAL};
pub use purchase::{PurchaseRecord, PurchaseStatus};
pub use transaction::{
    clamp_debit, require_positive, CreditTransaction, DebitOutcome, EntryDetails, LedgerEntry,
    PurchaseOutcome, TransactionType,
};
