use crate::emergency::{
    present, ActionOutcome, AlertAction, AlertCard, AlertState, AlertUpdate, EmergencyStatus,
    FallAlertMonitor,
};
use crate::messaging::{AlertEventType, EventBus, EventPublisher};
use crate::poller::{Poller, Polled, StatusSource};
use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Polls emergency status and drives the fall-alert monitor.
///
/// One instance belongs to one view; stopping (or dropping) it stops the
/// poller and the task applying its results.
pub struct FallAlertService {
    monitor: Arc<Mutex<FallAlertMonitor>>,
    events: Arc<EventBus>,
    poller: Poller,
    consumer: Option<JoinHandle<()>>,
}

impl FallAlertService {
    pub fn new(monitor: FallAlertMonitor, events: Arc<EventBus>, period: Duration) -> Self {
        Self {
            monitor: Arc::new(Mutex::new(monitor)),
            events,
            poller: Poller::new("emergency status", period),
            consumer: None,
        }
    }

    pub fn monitor(&self) -> Arc<Mutex<FallAlertMonitor>> {
        self.monitor.clone()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Start polling. Returns false when the endpoint is not configured.
    pub fn start<S>(&mut self, source: Option<Arc<S>>) -> bool
    where
        S: StatusSource<Status = EmergencyStatus>,
    {
        if self.poller.is_running() {
            return true;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if !self.poller.start(source, tx) {
            return false;
        }

        self.consumer = Some(tokio::spawn(consume(
            rx,
            self.monitor.clone(),
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

    pub async fn state(&self) -> AlertState {
        self.monitor.lock().await.state().clone()
    }

    /// Card for the current state, countdown computed now
    pub async fn card(&self) -> Option<AlertCard> {
        self.monitor.lock().await.card(Utc::now())
    }

    pub async fn dismiss(&self, timestamp: &str) -> Result<AlertUpdate> {
        let update = self.monitor.lock().await.dismiss(timestamp, Utc::now());
        publish_update(&self.events, &update).await;
        Ok(update)
    }

    pub async fn handle_action(&self, action: AlertAction) -> Result<ActionOutcome> {
        let outcome = self
            .monitor
            .lock()
            .await
            .handle_action(action, Utc::now())?;

        if let ActionOutcome::Dismissed { timestamp } = &outcome {
            self.events
                .publish(
                    AlertEventType::FallDismissed,
                    Some(timestamp.clone()),
                    serde_json::json!({"action": action}),
                )
                .await?;
        }
        Ok(outcome)
    }
}

impl Drop for FallAlertService {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn consume(
    mut rx: mpsc::UnboundedReceiver<Polled<EmergencyStatus>>,
    monitor: Arc<Mutex<FallAlertMonitor>>,
    events: Arc<EventBus>,
) {
    while let Some(polled) = rx.recv().await {
        let update = monitor
            .lock()
            .await
            .apply(polled.seq, polled.status, Utc::now());
        if let Some(update) = update {
            publish_update(&events, &update).await;
        }
    }
    info!("Emergency status consumer finished");
}

async fn publish_update(events: &EventBus, update: &AlertUpdate) {
    if !update.changed {
        return;
    }

    let payload = serde_json::json!({
        "previous": update.previous,
        "sounded": update.sounded,
        "card": present(&update.state),
    });
    if let Err(e) = events
        .publish(
            update.state.tag().into(),
            update.state.fall_timestamp().map(str::to_string),
            payload,
        )
        .await
    {
        warn!("Failed to publish alert state change: {}", e);
    }
}
