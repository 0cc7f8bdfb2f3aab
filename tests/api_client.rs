mod support;

use remindar_monitor::api::{ApiClient, Resource, Video};
use remindar_monitor::error::{classify, Error};
use remindar_monitor::security::{SessionStore, SessionUser};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use support::{FakeBackend, VALID_TOKEN};
use tempfile::tempdir;

fn caregiver() -> SessionUser {
    SessionUser {
        id: "caregiver-1".to_string(),
        name: None,
        email: None,
    }
}

async fn signed_in(dir: &std::path::Path, token: &str) -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::open(&dir.join("session.json")));
    session.login(token, caregiver()).await.unwrap();
    session
}

fn client(base: &str, session: Arc<SessionStore>) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5), session).unwrap()
}

#[tokio::test]
async fn reminder_crud() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let api = client(&base, signed_in(dir.path(), VALID_TOKEN).await);

    let created: Value = api
        .create(Resource::Reminders, &json!({"title": "Take pills", "time": "08:00"}))
        .await
        .unwrap();
    assert_eq!(created["reminderId"], json!("r1"));

    let updated: Value = api
        .update(Resource::Reminders, "r1", &json!({"time": "09:00"}))
        .await
        .unwrap();
    assert_eq!(updated["time"], json!("09:00"));
    assert_eq!(updated["title"], json!("Take pills"));

    let listed: Vec<Value> = api.list(Resource::Reminders).await.unwrap();
    assert_eq!(listed.len(), 1);

    api.delete(Resource::Reminders, "r1").await.unwrap();
    let listed: Vec<Value> = api.list(Resource::Reminders).await.unwrap();
    assert!(listed.is_empty());

    let err = api.delete(Resource::Reminders, "r1").await.unwrap_err();
    assert!(matches!(classify(&err), Some(Error::NotFound(_))));
}

#[tokio::test]
async fn videos_are_newest_first() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let api = client(&base, signed_in(dir.path(), VALID_TOKEN).await);

    let videos: Vec<Video> = api.videos().await.unwrap();
    let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
    assert_eq!(ids, vec!["v2", "v1"]);
    assert_eq!(videos[0].url.as_deref(), Some("https://cdn/v2.mp4"));
}

#[tokio::test]
async fn medication_edits_replace_the_record() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let api = client(&base, signed_in(dir.path(), VALID_TOKEN).await);

    let saved: Value = api
        .update(
            Resource::Medications,
            "med_1",
            &json!({"name": "Aspirin", "dosage": "81mg"}),
        )
        .await
        .unwrap();
    assert_eq!(saved["medicationId"], json!("med_1"));
    assert_eq!(saved["dosage"], json!("81mg"));
}

#[tokio::test]
async fn playback_links_come_from_the_backend() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let api = client(&base, signed_in(dir.path(), VALID_TOKEN).await);

    let link = api.playback_url("v2").await.unwrap();
    assert_eq!(link.playback_url, "https://cdn/v2.mp4?sig=abc");
    assert_eq!(link.expires_in, Some(3600));

    let err = api.playback_url("missing").await.unwrap_err();
    assert!(matches!(classify(&err), Some(Error::NotFound(_))));
}

#[tokio::test]
async fn family_photo_recognition() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let api = client(&base, signed_in(dir.path(), VALID_TOKEN).await);

    let found = api.recognize("grandma", None).await.unwrap().unwrap();
    assert_eq!(found.face_id, "face-1");
    let member = found.metadata.unwrap();
    assert_eq!(member.name.as_deref(), Some("Rose"));
    assert_eq!(member.relationship.as_deref(), Some("grandmother"));

    assert!(api.recognize("stranger", None).await.unwrap().is_none());
    assert!(api.recognize("grandma", Some(99.0)).await.unwrap().is_none());

    let err = api.recognize("", None).await.unwrap_err();
    assert!(matches!(classify(&err), Some(Error::Http { status: 400, .. })));
}

#[tokio::test]
async fn requests_without_a_session_fail_locally() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let session = Arc::new(SessionStore::open(&dir.path().join("session.json")));
    let api = client(&base, session);

    let err = api.list::<Value>(Resource::Reminders).await.unwrap_err();
    assert!(matches!(classify(&err), Some(Error::Authentication(_))));
}

#[tokio::test]
async fn rejected_token_clears_the_session() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let session = signed_in(dir.path(), "stale-token").await;
    let api = client(&base, session.clone());

    let err = session.verify(&api).await.unwrap_err();
    assert!(classify(&err).map_or(false, Error::is_auth_failure));
    assert!(!session.is_signed_in().await);

    // Nothing left on disk either
    let reopened = SessionStore::open(&dir.path().join("session.json"));
    assert!(reopened.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn accepted_token_refreshes_the_user() {
    let base = support::spawn(FakeBackend::new(Vec::new())).await;
    let dir = tempdir().unwrap();
    let session = signed_in(dir.path(), VALID_TOKEN).await;
    let api = client(&base, session.clone());

    let user = session.verify(&api).await.unwrap();
    assert_eq!(user.name.as_deref(), Some("Sam"));

    let reopened = SessionStore::open(&dir.path().join("session.json"));
    let restored = reopened.restore().await.unwrap().unwrap();
    assert_eq!(restored.token, VALID_TOKEN);
    assert_eq!(restored.user, user);
}

#[tokio::test]
async fn unreachable_backend_keeps_the_session() {
    // Bind then drop to get a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let dir = tempdir().unwrap();
    let session = signed_in(dir.path(), VALID_TOKEN).await;
    let api = ApiClient::new(
        &format!("http://{}", addr),
        Duration::from_secs(2),
        session.clone(),
    )
    .unwrap();

    assert!(session.verify(&api).await.is_err());
    assert!(session.is_signed_in().await);
}
