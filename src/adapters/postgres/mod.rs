//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCreditLedger` - Atomic grant/debit/purchase with transaction log
//! - `PostgresPurchaseRepository` - Purchase lookups by checkout session
//! - `PostgresDeliveryEventRepository` - Email delivery timeline

mod credit_ledger;
mod delivery_event_repository;
mod purchase_repository;

pub use credit_ledger::PostgresCreditLedger;
pub use delivery_event_repository::PostgresDeliveryEventRepository;
pub use purchase_repository::PostgresPurchaseRepository;
