use crate::error::Error;
use crate::messaging::event::{AlertEvent, AlertEventType};
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;

/// Event publishing trait
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event
    async fn publish<T: Serialize + Send>(
        &self,
        event_type: AlertEventType,
        source: Option<String>,
        payload: T,
    ) -> Result<()>;

    /// Subscribe to every event published from now on
    fn subscribe(&self) -> broadcast::Receiver<AlertEvent>;
}

/// In-process event bus. Slow subscribers lose the oldest events.
pub struct EventBus {
    sender: broadcast::Sender<AlertEvent>,
}

impl EventBus {
    /// Create a bus keeping up to `capacity` undelivered events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an already-built event
    pub fn send(&self, event: AlertEvent) {
        let routing_key = event.routing_key();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscribers", routing_key, receivers),
            Err(_) => debug!("No subscribers for {}", routing_key),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish<T: Serialize + Send>(
        &self,
        event_type: AlertEventType,
        source: Option<String>,
        payload: T,
    ) -> Result<()> {
        let event = AlertEvent::new(event_type, source, payload)
            .map_err(|e| Error::Serialization(format!("Failed to serialize event: {}", e)))?;
        self.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.sender.subscribe()
    }
}
