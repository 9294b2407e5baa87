//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod credits;
pub mod delivery;
pub mod payment;

pub use credits::{
    ConsumeCreditsHandler, CreditSummary, GetCreditSummaryHandler, GetCreditSummaryQuery,
    SweepReport,
};
pub use delivery::{
    RecordDeliveryEventCommand, RecordDeliveryEventHandler, RecordDeliveryEventResult,
};
pub use payment::{
    ProcessPaymentEventCommand, ProcessPaymentEventHandler, ProcessPaymentEventResult,
};
