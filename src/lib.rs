pub mod api;
pub mod config;
pub mod emergency;
pub mod error;
pub mod messaging;
pub mod poller;
pub mod security;
pub mod services;

// Re-export main components for easier use
pub use emergency::{
    classify, present, AlertAction, AlertCard, AlertState, AlertTag, DismissalStore,
    EmergencyStatus, FallAlertMonitor, FallEvent, UserResponse,
};
pub use error::Error;
pub use poller::{Poller, StatusSource};
pub use security::SessionStore;
pub use services::{FallAlertService, StreamStatusService};
