//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Webhook processors and the decay sweep are commands; the credit summary
//! is a query.

pub mod handlers;

pub use handlers::{
    // Credits
    ConsumeCreditsHandler, CreditSummary, GetCreditSummaryHandler, GetCreditSummaryQuery,
    SweepReport,
    // Delivery
    RecordDeliveryEventCommand, RecordDeliveryEventHandler, RecordDeliveryEventResult,
    // Payment
    ProcessPaymentEventCommand, ProcessPaymentEventHandler, ProcessPaymentEventResult,
};
