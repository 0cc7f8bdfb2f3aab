use crate::emergency::classifier::{AlertState, AlertTag};
use crate::emergency::models::FallEvent;
use serde::Serialize;

/// Text shown on a confirmed card when the wearer gave no words
pub const DEFAULT_RESPONSE_TEXT: &str = "okay";

/// Actions a caregiver can take from an alert card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    /// Hand off to the platform dialer; no backend call
    CallEmergencyServices,
    /// Open the recordings view around the fall
    ViewVideo,
    /// Hide the card for this fall for the rest of the session
    Dismiss,
}

/// Visual urgency of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Calm,
    Warning,
    Urgent,
    Success,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub label: &'static str,
    pub value: String,
}

/// Display view-model for one alert state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCard {
    pub kind: AlertTag,
    pub tone: Tone,
    pub title: String,
    pub message: String,
    pub countdown_secs: Option<u64>,
    pub readings: Vec<Reading>,
    pub actions: Vec<AlertAction>,
    /// Fall timestamp the card's actions apply to
    pub fall_timestamp: Option<String>,
}

/// Render an alert state. Dismissed falls render no card.
pub fn present(state: &AlertState) -> Option<AlertCard> {
    let card = match state {
        AlertState::Offline => AlertCard {
            kind: AlertTag::Offline,
            tone: Tone::Neutral,
            title: "Fall monitoring offline".to_string(),
            message: "The wearable is not reporting. Alerts resume when it reconnects.".to_string(),
            countdown_secs: None,
            readings: Vec::new(),
            actions: Vec::new(),
            fall_timestamp: None,
        },
        AlertState::Idle => AlertCard {
            kind: AlertTag::Idle,
            tone: Tone::Calm,
            title: "All clear".to_string(),
            message: "Fall monitoring is active. No falls detected.".to_string(),
            countdown_secs: None,
            readings: Vec::new(),
            actions: Vec::new(),
            fall_timestamp: None,
        },
        AlertState::Waiting {
            fall,
            countdown_secs,
        } => {
            let escalated = state.is_escalated();
            AlertCard {
                kind: AlertTag::Waiting,
                tone: if escalated { Tone::Urgent } else { Tone::Warning },
                title: titled("Fall detected", fall),
                message: if escalated {
                    "No response yet. Waiting for the device to report back.".to_string()
                } else {
                    format!("Waiting for a response... {}s", countdown_secs)
                },
                countdown_secs: Some(*countdown_secs),
                readings: vec![impact(fall), inactivity(fall)],
                actions: Vec::new(),
                fall_timestamp: Some(fall.timestamp.clone()),
            }
        }
        AlertState::Confirmed { fall } => AlertCard {
            kind: AlertTag::Confirmed,
            tone: Tone::Success,
            title: titled("Wearer confirmed they are okay", fall),
            message: response_text(fall).to_string(),
            countdown_secs: None,
            readings: Vec::new(),
            actions: vec![AlertAction::Dismiss],
            fall_timestamp: Some(fall.timestamp.clone()),
        },
        AlertState::Emergency { fall, elapsed_secs } => AlertCard {
            kind: AlertTag::Emergency,
            tone: Tone::Critical,
            title: titled("EMERGENCY: no response after fall", fall),
            message: "The wearer did not respond. Check on them now.".to_string(),
            countdown_secs: None,
            readings: vec![
                impact(fall),
                inactivity(fall),
                Reading {
                    label: "Time since fall",
                    value: format!("{}s", elapsed_secs),
                },
            ],
            actions: vec![
                AlertAction::CallEmergencyServices,
                AlertAction::ViewVideo,
                AlertAction::Dismiss,
            ],
            fall_timestamp: Some(fall.timestamp.clone()),
        },
        AlertState::Dismissed { .. } => return None,
    };
    Some(card)
}

fn response_text(fall: &FallEvent) -> &str {
    fall.response_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_RESPONSE_TEXT)
}

fn titled(title: &str, fall: &FallEvent) -> String {
    if fall.simulated {
        format!("{} (test)", title)
    } else {
        title.to_string()
    }
}

fn impact(fall: &FallEvent) -> Reading {
    Reading {
        label: "Impact",
        value: format!("{:.1} g", fall.impact_g),
    }
}

fn inactivity(fall: &FallEvent) -> Reading {
    Reading {
        label: "Inactivity",
        value: format!("{:.1} s", fall.inactivity_sec),
    }
}
