use crate::emergency::StreamStatus;
use crate::messaging::{AlertEventType, EventBus, EventPublisher};
use crate::poller::{Poller, Polled, SequenceGate, StatusSource};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Last known camera stream availability
#[derive(Debug, Default)]
pub struct StreamWatch {
    gate: SequenceGate,
    status: Option<StreamStatus>,
}

impl StreamWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown until the first successful poll
    pub fn available(&self) -> Option<bool> {
        self.status.as_ref().map(|s| s.available)
    }

    /// Apply a snapshot; returns the new availability when it changed
    pub fn apply(&mut self, seq: u64, status: StreamStatus) -> Option<bool> {
        if !self.gate.admit(seq) {
            return None;
        }
        let before = self.available();
        let now = status.available;
        self.status = Some(status);
        if before == Some(now) {
            None
        } else {
            Some(now)
        }
    }
}

/// Polls camera stream status and publishes availability changes
pub struct StreamStatusService {
    watch: Arc<Mutex<StreamWatch>>,
    events: Arc<EventBus>,
    poller: Poller,
    consumer: Option<JoinHandle<()>>,
    live_url: Option<String>,
}

impl StreamStatusService {
    pub fn new(events: Arc<EventBus>, period: Duration) -> Self {
        Self {
            watch: Arc::new(Mutex::new(StreamWatch::new())),
            events,
            poller: Poller::new("stream status", period),
            consumer: None,
            live_url: None,
        }
    }

    pub fn watch(&self) -> Arc<Mutex<StreamWatch>> {
        self.watch.clone()
    }

    /// MJPEG URL for the live view, when the stream base is configured
    pub fn live_url(&self) -> Option<&str> {
        self.live_url.as_deref()
    }

    pub fn start<S>(&mut self, source: Option<Arc<S>>, live_url: Option<String>) -> bool
    where
        S: StatusSource<Status = StreamStatus>,
    {
        if self.poller.is_running() {
            return true;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if !self.poller.start(source, tx) {
            return false;
        }

        self.live_url = live_url;
        self.consumer = Some(tokio::spawn(consume(
            rx,
            self.watch.clone(),
            self.events.clone(),
        )));
        true
    }

    pub fn stop(&mut self) {
        self.poller.stop();
        if let Some(consumer) = self.consumer.take() {
            consumer.abort();
        }
    }
}

impl Drop for StreamStatusService {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn consume(
    mut rx: mpsc::UnboundedReceiver<Polled<StreamStatus>>,
    watch: Arc<Mutex<StreamWatch>>,
    events: Arc<EventBus>,
) {
    while let Some(polled) = rx.recv().await {
        let status = polled.status.clone();
        let changed = watch.lock().await.apply(polled.seq, polled.status);

        if let Some(available) = changed {
            info!(
                "Camera stream {}",
                if available { "available" } else { "unavailable" }
            );
            let event_type = if available {
                AlertEventType::StreamAvailable
            } else {
                AlertEventType::StreamUnavailable
            };
            if let Err(e) = events.publish(event_type, None, status).await {
                warn!("Failed to publish stream status change: {}", e);
            }
        }
    }
}
