//! In-memory adapters for tests and local runs without a database.
//!
//! Each operation holds one lock for its whole read-modify-write, which gives
//! the same atomicity the PostgreSQL adapters get from a transaction.

mod delivery_events;
mod ledger;

pub use delivery_events::InMemoryDeliveryEvents;
pub use ledger::InMemoryLedger;
