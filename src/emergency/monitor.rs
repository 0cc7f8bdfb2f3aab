use crate::config::DeviceConfig;
use crate::emergency::classifier::{
    classify_with_window, AlertState, AlertTag, RESPONSE_WINDOW_SECS,
};
use crate::emergency::dismissal::DismissalStore;
use crate::emergency::models::{EmergencyStatus, FallEvent};
use crate::emergency::presenter::{present, AlertAction, AlertCard};
use crate::poller::SequenceGate;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::io::Write;
use std::sync::Arc;

/// Local audible cue played when a fall goes unanswered
pub trait AlertSound: Send + Sync {
    fn play(&self, fall: &FallEvent);
}

/// Platform dialer invoked from an emergency card
pub trait Dialer: Send + Sync {
    fn dial(&self, number: &str) -> Result<()>;
}

/// Rings the terminal bell
pub struct TerminalBell;

impl AlertSound for TerminalBell {
    fn play(&self, fall: &FallEvent) {
        warn!("Sounding alert for unanswered fall at {}", fall.timestamp);
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

/// Logs the call request; the host platform performs the actual call
pub struct LogDialer;

impl Dialer for LogDialer {
    fn dial(&self, number: &str) -> Result<()> {
        warn!("Requesting emergency call to {}", number);
        Ok(())
    }
}

/// Result of applying a snapshot or a local action
#[derive(Debug, Clone, PartialEq)]
pub struct AlertUpdate {
    pub state: AlertState,
    pub previous: AlertTag,
    /// The lifecycle position (tag or fall) moved
    pub changed: bool,
    /// The alert cue played during this update
    pub sounded: bool,
}

/// What a card action resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Dismissed { timestamp: String },
    Dialed { number: String },
    OpenRecordings { around: String },
    /// The current card does not offer this action
    Ignored,
}

/// Fall-alert lifecycle for one view: last known status, session dismissals,
/// and the one-shot alert cue.
pub struct FallAlertMonitor {
    dismissals: DismissalStore,
    gate: SequenceGate,
    last_status: Option<EmergencyStatus>,
    state: AlertState,
    response_window_secs: u64,
    emergency_number: String,
    sound: Arc<dyn AlertSound>,
    dialer: Arc<dyn Dialer>,
}

impl FallAlertMonitor {
    pub fn new(sound: Arc<dyn AlertSound>, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            dismissals: DismissalStore::new(),
            gate: SequenceGate::new(),
            last_status: None,
            state: AlertState::Offline,
            response_window_secs: RESPONSE_WINDOW_SECS,
            emergency_number: "911".to_string(),
            sound,
            dialer,
        }
    }

    pub fn from_config(
        config: &DeviceConfig,
        sound: Arc<dyn AlertSound>,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let mut monitor = Self::new(sound, dialer);
        monitor.response_window_secs = config.response_window_secs;
        monitor.emergency_number = config.emergency_number.clone();
        monitor
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn last_status(&self) -> Option<&EmergencyStatus> {
        self.last_status.as_ref()
    }

    pub fn dismissals(&self) -> &DismissalStore {
        &self.dismissals
    }

    /// Apply a polled snapshot. Returns `None` when `seq` is older than the
    /// last applied response.
    pub fn apply(
        &mut self,
        seq: u64,
        status: EmergencyStatus,
        now: DateTime<Utc>,
    ) -> Option<AlertUpdate> {
        if !self.gate.admit(seq) {
            debug!("Discarding stale emergency status #{}", seq);
            return None;
        }

        self.last_status = Some(status);
        Some(self.reevaluate(now))
    }

    /// Hide the card for `timestamp` and reclassify the last known status
    pub fn dismiss(&mut self, timestamp: &str, now: DateTime<Utc>) -> AlertUpdate {
        if self.dismissals.dismiss(timestamp) {
            info!("Fall alert {} dismissed", timestamp);
        }
        self.reevaluate(now)
    }

    /// Current card with the countdown recomputed at `now`
    pub fn card(&self, now: DateTime<Utc>) -> Option<AlertCard> {
        present(&self.classify_at(now))
    }

    /// Resolve an action taken on the current card
    pub fn handle_action(
        &mut self,
        action: AlertAction,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome> {
        let card = match self.card(now) {
            Some(card) if card.actions.contains(&action) => card,
            _ => {
                debug!("Ignoring {:?}: not offered by the current card", action);
                return Ok(ActionOutcome::Ignored);
            }
        };

        let timestamp = match card.fall_timestamp {
            Some(timestamp) => timestamp,
            None => return Ok(ActionOutcome::Ignored),
        };

        match action {
            AlertAction::Dismiss => {
                self.dismiss(&timestamp, now);
                Ok(ActionOutcome::Dismissed { timestamp })
            }
            AlertAction::CallEmergencyServices => {
                self.dialer.dial(&self.emergency_number)?;
                Ok(ActionOutcome::Dialed {
                    number: self.emergency_number.clone(),
                })
            }
            AlertAction::ViewVideo => Ok(ActionOutcome::OpenRecordings { around: timestamp }),
        }
    }

    fn classify_at(&self, now: DateTime<Utc>) -> AlertState {
        match &self.last_status {
            Some(status) => {
                classify_with_window(status, &self.dismissals, now, self.response_window_secs)
            }
            None => AlertState::Offline,
        }
    }

    fn reevaluate(&mut self, now: DateTime<Utc>) -> AlertUpdate {
        let state = self.classify_at(now);
        let previous = self.state.tag();
        let changed = !self.state.same_position(&state);

        let mut sounded = false;
        if let AlertState::Emergency { fall, .. } = &state {
            if self.dismissals.mark_alerted(&fall.timestamp) {
                self.sound.play(fall);
                sounded = true;
            }
        }

        if changed {
            info!(
                "Fall alert state {} -> {}{}",
                previous,
                state.tag(),
                state
                    .fall_timestamp()
                    .map(|ts| format!(" (fall {})", ts))
                    .unwrap_or_default()
            );
        }

        self.state = state.clone();
        AlertUpdate {
            state,
            previous,
            changed,
            sounded,
        }
    }
}
