//! Email delivery-status timeline.

mod event;

pub use event::{normalize_event_data, DeliveryEnvelope, DeliveryEvent, DeliveryEventType};
