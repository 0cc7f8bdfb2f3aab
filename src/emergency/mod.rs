pub mod classifier;
pub mod dismissal;
pub mod models;
pub mod monitor;
pub mod presenter;

pub use classifier::{classify, AlertState, AlertTag};
pub use dismissal::DismissalStore;
pub use models::{EmergencyStatus, FallEvent, StreamStatus, UserResponse};
pub use monitor::{ActionOutcome, AlertSound, AlertUpdate, Dialer, FallAlertMonitor};
pub use presenter::{present, AlertAction, AlertCard};
