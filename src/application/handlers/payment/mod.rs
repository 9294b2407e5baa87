//! Payment provider event handlers.

mod process_payment_event;

pub use process_payment_event::{
    ProcessPaymentEventCommand, ProcessPaymentEventHandler, ProcessPaymentEventResult,
};
