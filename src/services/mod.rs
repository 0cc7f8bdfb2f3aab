pub mod fall_alerts;
pub mod stream_status;

pub use fall_alerts::FallAlertService;
pub use stream_status::{StreamStatusService, StreamWatch};
