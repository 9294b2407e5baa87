//! Email delivery-status event handlers.

mod record_delivery_event;

pub use record_delivery_event::{
    RecordDeliveryEventCommand, RecordDeliveryEventHandler, RecordDeliveryEventResult,
};
