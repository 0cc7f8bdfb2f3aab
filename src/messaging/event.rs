use crate::emergency::AlertTag;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Event types published by the monitor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AlertEventType {
    // Monitoring events
    MonitorOffline,
    MonitorIdle,

    // Fall lifecycle events
    FallWaiting,
    FallConfirmed,
    FallEmergency,
    FallDismissed,

    // Camera stream events
    StreamAvailable,
    StreamUnavailable,

    // Session events
    SessionRestored,
    SessionExpired,

    // System events
    SystemStartup,
    SystemShutdown,
}

impl Display for AlertEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MonitorOffline => write!(f, "monitor.offline"),
            Self::MonitorIdle => write!(f, "monitor.idle"),
            Self::FallWaiting => write!(f, "fall.waiting"),
            Self::FallConfirmed => write!(f, "fall.confirmed"),
            Self::FallEmergency => write!(f, "fall.emergency"),
            Self::FallDismissed => write!(f, "fall.dismissed"),
            Self::StreamAvailable => write!(f, "stream.available"),
            Self::StreamUnavailable => write!(f, "stream.unavailable"),
            Self::SessionRestored => write!(f, "session.restored"),
            Self::SessionExpired => write!(f, "session.expired"),
            Self::SystemStartup => write!(f, "system.startup"),
            Self::SystemShutdown => write!(f, "system.shutdown"),
        }
    }
}

impl From<AlertTag> for AlertEventType {
    fn from(tag: AlertTag) -> Self {
        match tag {
            AlertTag::Offline => Self::MonitorOffline,
            AlertTag::Idle => Self::MonitorIdle,
            AlertTag::Waiting => Self::FallWaiting,
            AlertTag::Confirmed => Self::FallConfirmed,
            AlertTag::Emergency => Self::FallEmergency,
            AlertTag::Dismissed => Self::FallDismissed,
        }
    }
}

/// Event message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique event ID
    pub id: Uuid,
    /// Event type
    pub event_type: AlertEventType,
    /// Event source (fall timestamp for lifecycle events)
    pub source: Option<String>,
    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event data payload
    pub payload: serde_json::Value,
}

impl AlertEvent {
    /// Create a new event message
    pub fn new<T: Serialize>(
        event_type: AlertEventType,
        source: Option<String>,
        payload: T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            event_type,
            source,
            timestamp: chrono::Utc::now(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Create a new event message with empty payload
    pub fn new_empty(event_type: AlertEventType, source: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            source,
            timestamp: chrono::Utc::now(),
            payload: serde_json::Value::Null,
        }
    }

    /// Get the routing key for the event
    pub fn routing_key(&self) -> String {
        match &self.source {
            Some(source) => format!("{}.{}", self.event_type, source),
            None => self.event_type.to_string(),
        }
    }
}
