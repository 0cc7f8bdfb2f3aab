pub mod bus;
pub mod event;

pub use bus::{EventBus, EventPublisher};
pub use event::{AlertEvent, AlertEventType};
