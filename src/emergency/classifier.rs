//! Fall-alert lifecycle classification.
//!
//! The backend is the only authority on a fall's `user_response`, so the
//! classifier never advances a state on its own: Waiting stays Waiting (with
//! an escalated countdown) until a poll reports Confirmed or NoResponse.
//!
//! Evaluation order:
//!
//! ```text
//! monitoring inactive            -> Offline
//! no latest fall                 -> Idle
//! latest fall timestamp hidden   -> Dismissed
//! user_response = Unset          -> Waiting
//! user_response = Confirmed      -> Confirmed
//! user_response = NoResponse     -> Emergency
//! ```

use crate::emergency::dismissal::DismissalStore;
use crate::emergency::models::{EmergencyStatus, FallEvent, UserResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Seconds the wearer has to answer before the waiting card escalates
pub const RESPONSE_WINDOW_SECS: u64 = 15;

/// The visible alert state for one status snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum AlertState {
    /// Monitoring is switched off or the device is unreachable
    Offline,
    /// Monitoring is active and no fall is known
    Idle,
    /// A fall was detected and the wearer has not answered yet
    Waiting { fall: FallEvent, countdown_secs: u64 },
    /// The wearer said they are okay
    Confirmed { fall: FallEvent },
    /// The response window passed without an answer
    Emergency { fall: FallEvent, elapsed_secs: u64 },
    /// The latest fall was hidden by the user this session
    Dismissed { timestamp: String },
}

/// Discriminant of [`AlertState`], used to detect transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTag {
    Offline,
    Idle,
    Waiting,
    Confirmed,
    Emergency,
    Dismissed,
}

impl Display for AlertTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Idle => write!(f, "idle"),
            Self::Waiting => write!(f, "waiting"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Emergency => write!(f, "emergency"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

impl AlertState {
    pub fn tag(&self) -> AlertTag {
        match self {
            Self::Offline => AlertTag::Offline,
            Self::Idle => AlertTag::Idle,
            Self::Waiting { .. } => AlertTag::Waiting,
            Self::Confirmed { .. } => AlertTag::Confirmed,
            Self::Emergency { .. } => AlertTag::Emergency,
            Self::Dismissed { .. } => AlertTag::Dismissed,
        }
    }

    /// The fall behind a visible alert card
    pub fn fall(&self) -> Option<&FallEvent> {
        match self {
            Self::Waiting { fall, .. }
            | Self::Confirmed { fall }
            | Self::Emergency { fall, .. } => Some(fall),
            Self::Offline | Self::Idle | Self::Dismissed { .. } => None,
        }
    }

    /// Timestamp of the fall this state refers to, dismissed or not
    pub fn fall_timestamp(&self) -> Option<&str> {
        match self {
            Self::Dismissed { timestamp } => Some(timestamp),
            other => other.fall().map(|fall| fall.timestamp.as_str()),
        }
    }

    /// A waiting alert whose response window has run out
    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::Waiting { countdown_secs: 0, .. })
    }

    /// Same lifecycle position: same tag and same fall
    pub fn same_position(&self, other: &AlertState) -> bool {
        self.tag() == other.tag() && self.fall_timestamp() == other.fall_timestamp()
    }
}

/// Classify with the default response window
pub fn classify(
    status: &EmergencyStatus,
    dismissals: &DismissalStore,
    now: DateTime<Utc>,
) -> AlertState {
    classify_with_window(status, dismissals, now, RESPONSE_WINDOW_SECS)
}

/// Classify a status snapshot. Pure: same inputs, same state.
pub fn classify_with_window(
    status: &EmergencyStatus,
    dismissals: &DismissalStore,
    now: DateTime<Utc>,
    response_window_secs: u64,
) -> AlertState {
    if !status.monitoring_active {
        return AlertState::Offline;
    }

    let fall = match &status.latest_fall {
        Some(fall) => fall,
        None => return AlertState::Idle,
    };

    if dismissals.has_dismissed(&fall.timestamp) {
        return AlertState::Dismissed {
            timestamp: fall.timestamp.clone(),
        };
    }

    let elapsed_secs = fall.elapsed_secs(now);
    match fall.user_response {
        UserResponse::Unset => AlertState::Waiting {
            fall: fall.clone(),
            countdown_secs: response_window_secs.saturating_sub(elapsed_secs),
        },
        UserResponse::Confirmed => AlertState::Confirmed { fall: fall.clone() },
        UserResponse::NoResponse => AlertState::Emergency {
            fall: fall.clone(),
            elapsed_secs,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()
    }

    fn fall(timestamp: &str, response: UserResponse) -> FallEvent {
        FallEvent {
            user_response: response,
            ..FallEvent::new(timestamp)
        }
    }

    /// Active monitoring with a fall detected at `base_time()`
    fn active_with(response: UserResponse) -> EmergencyStatus {
        EmergencyStatus::active(Some(fall("2026-10-16T08:00:00Z", response)))
    }

    #[test]
    fn inactive_monitoring_is_offline_whatever_the_fall() {
        let store = DismissalStore::new();
        let responses = [
            None,
            Some(UserResponse::Unset),
            Some(UserResponse::Confirmed),
            Some(UserResponse::NoResponse),
        ];
        for response in responses {
            let status = EmergencyStatus {
                monitoring_active: false,
                latest_fall: response.map(|r| fall("2026-10-16T08:00:00Z", r)),
                current_readings: None,
            };
            assert_eq!(classify(&status, &store, base_time()), AlertState::Offline);
        }
    }

    #[test]
    fn active_without_fall_is_idle() {
        let state = classify(
            &EmergencyStatus::active(None),
            &DismissalStore::new(),
            base_time(),
        );
        assert_eq!(state, AlertState::Idle);
    }

    #[test]
    fn countdown_tracks_elapsed_and_stops_at_zero() {
        let store = DismissalStore::new();
        let status = active_with(UserResponse::Unset);

        for (offset, expected) in [(0, 15), (4, 11), (15, 0), (16, 0), (600, 0)] {
            let state = classify(&status, &store, base_time() + Duration::seconds(offset));
            match state {
                AlertState::Waiting { countdown_secs, .. } => {
                    assert_eq!(countdown_secs, expected, "offset {}", offset)
                }
                other => panic!("expected waiting, got {:?}", other),
            }
        }
    }

    #[test]
    fn escalation_does_not_change_state() {
        let status = active_with(UserResponse::Unset);
        let state = classify(
            &status,
            &DismissalStore::new(),
            base_time() + Duration::seconds(90),
        );
        assert_eq!(state.tag(), AlertTag::Waiting);
        assert!(state.is_escalated());
    }

    #[test]
    fn custom_window_is_respected() {
        let status = active_with(UserResponse::Unset);
        let state = classify_with_window(
            &status,
            &DismissalStore::new(),
            base_time() + Duration::seconds(10),
            30,
        );
        assert!(matches!(state, AlertState::Waiting { countdown_secs: 20, .. }));
    }

    #[test]
    fn responses_map_to_confirmed_and_emergency() {
        let store = DismissalStore::new();
        let now = base_time() + Duration::seconds(42);

        let confirmed = active_with(UserResponse::Confirmed);
        assert_eq!(classify(&confirmed, &store, now).tag(), AlertTag::Confirmed);

        let emergency = active_with(UserResponse::NoResponse);
        match classify(&emergency, &store, now) {
            AlertState::Emergency { elapsed_secs, .. } => assert_eq!(elapsed_secs, 42),
            other => panic!("expected emergency, got {:?}", other),
        }
    }

    #[test]
    fn dismissal_hides_only_that_timestamp() {
        let mut store = DismissalStore::new();
        store.dismiss("t1");

        let same = EmergencyStatus::active(Some(fall("t1", UserResponse::NoResponse)));
        assert_eq!(
            classify(&same, &store, base_time()),
            AlertState::Dismissed {
                timestamp: "t1".to_string()
            }
        );

        let newer = EmergencyStatus::active(Some(fall("t2", UserResponse::Unset)));
        assert_eq!(classify(&newer, &store, base_time()).tag(), AlertTag::Waiting);
    }

    #[test]
    fn dismissal_does_not_hide_offline() {
        let mut store = DismissalStore::new();
        store.dismiss("t1");
        let status = EmergencyStatus {
            monitoring_active: false,
            latest_fall: Some(fall("t1", UserResponse::NoResponse)),
            current_readings: None,
        };
        assert_eq!(classify(&status, &store, base_time()), AlertState::Offline);
    }

    #[test]
    fn same_position_ignores_countdown() {
        let status = active_with(UserResponse::Unset);
        let store = DismissalStore::new();
        let early = classify(&status, &store, base_time());
        let later = classify(&status, &store, base_time() + Duration::seconds(5));
        assert_ne!(early, later);
        assert!(early.same_position(&later));
    }
}
