//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the ledger domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DeliveryEventId, OwnerId, PurchaseId, TransactionId};
pub use state_machine::{StateMachine, TransitionOutcome};
pub use timestamp::Timestamp;
