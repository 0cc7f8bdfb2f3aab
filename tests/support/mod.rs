#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const VALID_TOKEN: &str = "valid-token";

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Fail(u16),
}

/// Scripted stand-in for the managed backend
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<VecDeque<Reply>>,
    last_good: Mutex<Option<Value>>,
    status_hits: AtomicUsize,
    reminders: Mutex<Vec<Value>>,
}

impl FakeBackend {
    pub fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn status_hits(&self) -> usize {
        self.status_hits.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Reply::Json(value)) => {
                *self.last_good.lock().unwrap() = Some(value.clone());
                Reply::Json(value)
            }
            Some(fail) => fail,
            None => match self.last_good.lock().unwrap().clone() {
                Some(value) => Reply::Json(value),
                None => Reply::Fail(503),
            },
        }
    }
}

/// Serve the fake backend on an ephemeral port, returning its base URL
pub async fn spawn(backend: Arc<FakeBackend>) -> String {
    let app = Router::new()
        .route("/accelerometer/emergency/status", get(emergency_status))
        .route("/stream/status", get(stream_status))
        .route("/auth/me", get(whoami))
        .route("/reminders", get(list_reminders).post(create_reminder))
        .route("/reminders/:id", patch(update_reminder).delete(delete_reminder))
        .route("/videos", get(list_videos))
        .route("/videos/:id/playback-url", get(playback_url))
        .route("/medications/:id", put(replace_medication))
        .route("/recognize", post(recognize))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());
    tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://{}", addr)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", VALID_TOKEN))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "token expired"})),
    )
        .into_response()
}

async fn emergency_status(State(backend): State<Arc<FakeBackend>>, headers: HeaderMap) -> Response {
    backend.status_hits.fetch_add(1, Ordering::SeqCst);

    let accepts_json = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.contains("application/json"));
    if !accepts_json {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }

    match backend.next_reply() {
        Reply::Json(value) => Json(value).into_response(),
        Reply::Fail(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

async fn stream_status() -> Json<Value> {
    Json(json!({"available": true, "fps": 15.0, "resolution": "640x480"}))
}

async fn whoami(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"userId": "caregiver-1", "name": "Sam"})).into_response()
}

async fn list_reminders(State(backend): State<Arc<FakeBackend>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let items = backend.reminders.lock().unwrap().clone();
    Json(json!({"items": items})).into_response()
}

async fn create_reminder(
    State(backend): State<Arc<FakeBackend>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut reminders = backend.reminders.lock().unwrap();
    body["reminderId"] = json!(format!("r{}", reminders.len() + 1));
    reminders.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_reminder(
    State(backend): State<Arc<FakeBackend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut reminders = backend.reminders.lock().unwrap();
    let found = reminders
        .iter_mut()
        .find(|r| r["reminderId"] == json!(id.as_str()));
    match found {
        Some(reminder) => {
            if let (Some(target), Some(changes)) = (reminder.as_object_mut(), patch.as_object()) {
                for (k, v) in changes {
                    target.insert(k.clone(), v.clone());
                }
            }
            Json(reminder.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response(),
    }
}

async fn delete_reminder(
    State(backend): State<Arc<FakeBackend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut reminders = backend.reminders.lock().unwrap();
    let before = reminders.len();
    reminders.retain(|r| r["reminderId"] != json!(id.as_str()));
    if reminders.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_videos(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"videoId": "v1", "recordedAt": "2026-10-16T07:00:00Z"},
        {
            "videoId": "v2",
            "recordedAt": "2026-10-16T08:00:05Z",
            "presignedUrl": "https://cdn/v2.mp4"
        }
    ]))
    .into_response()
}

async fn playback_url(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id != "v2" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "video not found"}))).into_response();
    }
    Json(json!({
        "playbackUrl": "https://cdn/v2.mp4?sig=abc",
        "s3Key": "videos/v2.mp4",
        "expiresIn": 3600
    }))
    .into_response()
}

async fn replace_medication(
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    body["medicationId"] = json!(id);
    Json(body).into_response()
}

async fn recognize(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let image = body["imageBase64"].as_str().unwrap_or_default();
    let threshold = body["minConfidence"].as_f64().unwrap_or(85.0);
    if image.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "imageBase64 is required"})),
        )
            .into_response();
    }
    if image != "grandma" || threshold > 98.0 {
        return Json(json!({"match": null})).into_response();
    }
    Json(json!({
        "match": {
            "faceId": "face-1",
            "similarity": 98.0,
            "metadata": {
                "familyMemberId": "fam_1",
                "name": "Rose",
                "relationship": "grandmother",
                "userId": "u_123"
            }
        }
    }))
    .into_response()
}
