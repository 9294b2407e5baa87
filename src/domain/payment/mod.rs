//! Payment provider events.

mod event;

pub use event::{CheckoutCompletion, PaymentEvent, PaymentEventData, PaymentEventType};
