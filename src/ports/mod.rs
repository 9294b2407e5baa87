//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Ledger Ports
//!
//! - `CreditLedger` - Atomic grant/debit/purchase with transaction-log append
//!   and the active/suspended transitions they trigger
//! - `PurchaseRepository` - Session lookups for payment confirmations
//!
//! ## Delivery Ports
//!
//! - `DeliveryEventRepository` - Email delivery timeline

mod credit_ledger;
mod delivery_event_repository;
mod purchase_repository;

pub use credit_ledger::CreditLedger;
pub use delivery_event_repository::DeliveryEventRepository;
pub use purchase_repository::PurchaseRepository;
