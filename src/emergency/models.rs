use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wearer's answer to the "are you okay?" prompt after a fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserResponse {
    /// No answer yet; the device is still waiting
    #[default]
    Unset,
    /// The wearer confirmed they are okay
    Confirmed,
    /// The response window elapsed without an answer
    NoResponse,
}

impl UserResponse {
    fn from_wire(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "CONFIRMED" => UserResponse::Confirmed,
            "NORESPONSE" => UserResponse::NoResponse,
            _ => UserResponse::Unset,
        }
    }
}

impl Serialize for UserResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UserResponse::Unset => serializer.serialize_none(),
            UserResponse::Confirmed => serializer.serialize_str("CONFIRMED"),
            UserResponse::NoResponse => serializer.serialize_str("NO_RESPONSE"),
        }
    }
}

impl<'de> Deserialize<'de> for UserResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(raw)) => UserResponse::from_wire(&raw),
            _ => UserResponse::Unset,
        })
    }
}

/// One detected fall, as reported by the wearable/backend.
///
/// The timestamp doubles as the event identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    #[serde(default, alias = "freefallMagnitude", alias = "freefall_magnitude")]
    pub freefall_g: f64,
    #[serde(default, alias = "impactMagnitude", alias = "impact_magnitude")]
    pub impact_g: f64,
    #[serde(default, alias = "inactivityDuration", alias = "inactivity_duration")]
    pub inactivity_sec: f64,
    #[serde(default, alias = "userResponse")]
    pub user_response: UserResponse,
    #[serde(default, alias = "responseText", skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(default)]
    pub simulated: bool,
}

impl FallEvent {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            freefall_g: 0.0,
            impact_g: 0.0,
            inactivity_sec: 0.0,
            user_response: UserResponse::Unset,
            response_text: None,
            simulated: false,
        }
    }

    /// Parsed detection time, if the timestamp is a recognisable ISO-8601 value
    pub fn detected_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Whole seconds since detection. Unparseable or future timestamps count as zero.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        self.detected_at()
            .map(|at| (now - at).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }
}

/// Live accelerometer snapshot; informational only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerometerReading {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub magnitude: Option<f64>,
}

/// Polled snapshot of `/accelerometer/emergency/status`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmergencyStatus {
    #[serde(default, alias = "monitoringActive")]
    pub monitoring_active: bool,
    #[serde(default, alias = "latestFall")]
    pub latest_fall: Option<FallEvent>,
    #[serde(default, alias = "currentReadings")]
    pub current_readings: Option<AccelerometerReading>,
}

impl EmergencyStatus {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn active(latest_fall: Option<FallEvent>) -> Self {
        Self {
            monitoring_active: true,
            latest_fall,
            current_readings: None,
        }
    }
}

/// Polled snapshot of `/stream/status`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamStatus {
    #[serde(default, alias = "active", alias = "streaming", alias = "online")]
    pub available: bool,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub clients: Option<u32>,
}

/// Numeric timestamps at or above this are milliseconds since the epoch
const EPOCH_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Parse an RFC 3339 timestamp, falling back to a naive ISO-8601 value read as
/// UTC, then to Unix epoch seconds or milliseconds
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(parsed) = parse_epoch(raw) {
        return Some(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value: f64 = raw.parse().ok()?;
    let millis = if value >= EPOCH_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected timestamp string, got {}",
            other
        ))),
    }
}
