use crate::api::http::{build_client, endpoint, normalize_base, send, send_json};
use crate::config::Config;
use crate::error::Error;
use crate::security::session::{SessionStore, SessionUser, WhoAmI};
use anyhow::Result;
use async_trait::async_trait;
use log::info;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

const WHOAMI_PATH: &str = "auth/me";
const RECOGNIZE_PATH: &str = "recognize";

/// Similarity threshold the backend applies when none is given
pub const DEFAULT_MIN_CONFIDENCE: f64 = 85.0;

/// Backend collections reachable through the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Reminders,
    Medications,
    Family,
    Cognitive,
    Locations,
    Videos,
    Devices,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Reminders => "reminders",
            Self::Medications => "medications",
            Self::Family => "family",
            Self::Cognitive => "cognitive",
            Self::Locations => "locations",
            Self::Videos => "videos",
            Self::Devices => "devices",
        }
    }

    /// Verb the backend accepts for edits: medications are replaced whole,
    /// everything else is patched
    pub fn update_method(&self) -> Method {
        match self {
            Self::Medications => Method::PUT,
            _ => Method::PATCH,
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A registered wearable or camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default = "default_device_name")]
    pub name: String,
    #[serde(default = "default_device_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

fn default_device_name() -> String {
    "Untitled Device".to_string()
}

fn default_device_status() -> String {
    "active".to_string()
}

/// A recorded clip, e.g. the footage around a fall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<String>,
    #[serde(default, alias = "presignedUrl", alias = "videoUrl")]
    pub url: Option<String>,
    #[serde(default)]
    pub duration_sec: Option<f64>,
}

/// Short-lived link for playing back a recorded clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackUrl {
    pub playback_url: String,
    #[serde(default)]
    pub s3_key: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Family member behind a recognised face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMatch {
    #[serde(default)]
    pub family_member_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub photo_s3_key: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Best face match for a photo. `metadata` is empty when the face is
/// indexed but no family member record points at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMatch {
    pub face_id: String,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub metadata: Option<FamilyMatch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    image_base64: &'a str,
    min_confidence: f64,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default, rename = "match")]
    found: Option<FaceMatch>,
}

/// Bearer-authenticated client for the REST API
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionStore>) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base: normalize_base(base_url)?,
            session,
        })
    }

    /// Build from configuration; `None` when no API base URL is configured
    pub fn from_config(config: &Config, session: Arc<SessionStore>) -> Result<Option<Self>> {
        match config.api_base() {
            Some(base) => Ok(Some(Self::new(
                base,
                Duration::from_secs(config.api.timeout_secs),
                session,
            )?)),
            None => Ok(None),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>> {
        let request = self.authorized(self.http.get(self.collection_url(resource))).await?;
        let body: serde_json::Value = send_json(request).await?;
        let items = extract_items(body, resource)?;
        serde_json::from_value(items)
            .map_err(|e| Error::Serialization(format!("Invalid {} list: {}", resource, e)).into())
    }

    pub async fn get<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T> {
        let request = self.authorized(self.http.get(self.item_url(resource, id))).await?;
        send_json(request).await
    }

    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .authorized(self.http.post(self.collection_url(resource)).json(body))
            .await?;
        let created = send_json(request).await?;
        info!("Created {} entry", resource);
        Ok(created)
    }

    pub async fn update<B, T>(&self, resource: Resource, id: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(resource.update_method(), self.item_url(resource, id));
        let request = self.authorized(request.json(body)).await?;
        send_json(request).await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<()> {
        let request = self.authorized(self.http.delete(self.item_url(resource, id))).await?;
        send(request).await?;
        info!("Deleted {} {}", resource, id);
        Ok(())
    }

    pub async fn devices(&self) -> Result<Vec<Device>> {
        self.list(Resource::Devices).await
    }

    /// Recordings, newest first
    pub async fn videos(&self) -> Result<Vec<Video>> {
        let mut videos: Vec<Video> = self.list(Resource::Videos).await?;
        videos.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(videos)
    }

    /// Presigned playback link for a recording
    pub async fn playback_url(&self, video_id: &str) -> Result<PlaybackUrl> {
        let url = endpoint(
            &self.base,
            &format!("{}/{}/playback-url", Resource::Videos.path(), video_id),
        );
        let request = self.authorized(self.http.get(url)).await?;
        send_json(request).await
    }

    /// Match a photo against the enrolled family faces. `image_base64` may
    /// carry a `data:` URL prefix; the backend strips it.
    pub async fn recognize(
        &self,
        image_base64: &str,
        min_confidence: Option<f64>,
    ) -> Result<Option<FaceMatch>> {
        let body = RecognizeRequest {
            image_base64,
            min_confidence: min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
        };
        let request = self
            .authorized(self.http.post(endpoint(&self.base, RECOGNIZE_PATH)).json(&body))
            .await?;
        let response: RecognizeResponse = send_json(request).await?;
        Ok(response.found)
    }

    fn collection_url(&self, resource: Resource) -> String {
        endpoint(&self.base, resource.path())
    }

    fn item_url(&self, resource: Resource, id: &str) -> String {
        endpoint(&self.base, &format!("{}/{}", resource.path(), id))
    }

    async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        let token = self
            .session
            .token()
            .await
            .ok_or_else(|| Error::Authentication("Not signed in".to_string()))?;
        Ok(request.bearer_auth(token))
    }
}

#[async_trait]
impl WhoAmI for ApiClient {
    async fn whoami(&self, token: &str) -> Result<SessionUser> {
        let request = self
            .http
            .get(endpoint(&self.base, WHOAMI_PATH))
            .bearer_auth(token);
        send_json(request).await
    }
}

/// Accept either a bare JSON array or an `{"items": [...]}` envelope
fn extract_items(body: serde_json::Value, resource: Resource) -> Result<serde_json::Value> {
    match body {
        serde_json::Value::Array(_) => Ok(body),
        serde_json::Value::Object(mut map) => match map.remove("items") {
            Some(items @ serde_json::Value::Array(_)) => Ok(items),
            _ => {
                Err(Error::Serialization(format!("{} response has no item list", resource)).into())
            }
        },
        _ => Err(Error::Serialization(format!("{} response is not a list", resource)).into()),
    }
}
