use crate::api::http::{build_client, endpoint, normalize_base, send_json};
use crate::config::Config;
use crate::emergency::{EmergencyStatus, StreamStatus};
use crate::poller::StatusSource;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const EMERGENCY_STATUS_PATH: &str = "accelerometer/emergency/status";
const STREAM_STATUS_PATH: &str = "stream/status";
const STREAM_LIVE_PATH: &str = "stream/live";

/// Client for the wearable/camera device endpoints under the stream base URL
pub struct DeviceClient {
    http: reqwest::Client,
    base: String,
}

impl DeviceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base: normalize_base(base_url)?,
        })
    }

    /// Build from configuration; `None` when no stream base URL is configured
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match config.stream_base() {
            Some(base) => Ok(Some(Self::new(
                base,
                Duration::from_secs(config.api.timeout_secs),
            )?)),
            None => Ok(None),
        }
    }

    pub fn emergency_status_url(&self) -> String {
        endpoint(&self.base, EMERGENCY_STATUS_PATH)
    }

    pub fn stream_status_url(&self) -> String {
        endpoint(&self.base, STREAM_STATUS_PATH)
    }

    /// MJPEG live view, consumed directly by an image element
    pub fn live_url(&self) -> String {
        endpoint(&self.base, STREAM_LIVE_PATH)
    }

    pub async fn emergency_status(&self) -> Result<EmergencyStatus> {
        send_json(self.http.get(self.emergency_status_url())).await
    }

    pub async fn stream_status(&self) -> Result<StreamStatus> {
        send_json(self.http.get(self.stream_status_url())).await
    }
}

/// Emergency status endpoint as a poll source
pub struct EmergencyStatusSource(pub Arc<DeviceClient>);

#[async_trait]
impl StatusSource for EmergencyStatusSource {
    type Status = EmergencyStatus;

    fn name(&self) -> &str {
        EMERGENCY_STATUS_PATH
    }

    async fn fetch(&self) -> Result<EmergencyStatus> {
        self.0.emergency_status().await
    }
}

/// Camera stream status endpoint as a poll source
pub struct StreamStatusSource(pub Arc<DeviceClient>);

#[async_trait]
impl StatusSource for StreamStatusSource {
    type Status = StreamStatus;

    fn name(&self) -> &str {
        STREAM_STATUS_PATH
    }

    async fn fetch(&self) -> Result<StreamStatus> {
        self.0.stream_status().await
    }
}
