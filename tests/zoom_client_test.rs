use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;

use aula_virtual::{config::ZoomConfig, error::Error, services::zoom_service::ZoomClient};

const TOKEN: &str = "fake-access-token";

async fn token(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let basic = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    let grant_ok = query.get("grant_type").map(String::as_str) == Some("account_credentials")
        && query.get("account_id").map(String::as_str) == Some("acct-1");
    if !basic || !grant_ok {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "reason": "invalid_client" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "access_token": TOKEN, "token_type": "bearer", "expires_in": 3599 })),
    )
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn create_meeting(headers: HeaderMap, Json(body): Json<JsonValue>) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "code": 124, "message": "Invalid access token." })));
    }
    if body["topic"] == "reject me" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": 300, "message": "Invalid meeting topic." })),
        );
    }
    assert_eq!(body["type"], 2);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 85746065432_i64,
            "topic": body["topic"],
            "start_time": body["start_time"],
            "duration": body["duration"],
            "join_url": "https://zoom.us/j/85746065432",
            "start_url": "https://zoom.us/s/85746065432"
        })),
    )
}

async fn recordings(headers: HeaderMap, Path(id): Path<i64>) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": 3301, "message": "This recording does not exist." })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "recording_files": [{
                "id": "rec-1",
                "file_type": "MP4",
                "file_size": 1048576,
                "play_url": "https://zoom.us/rec/play/1",
                "download_url": "https://zoom.us/rec/download/1",
                "recording_start": "2025-04-02T15:30:00Z",
                "recording_end": "2025-04-02T16:30:00Z"
            }]
        })),
    )
}

async fn spawn_fake_zoom() -> ZoomConfig {
    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/v2/users/me/meetings", post(create_meeting))
        .route("/v2/meetings/:id/recordings", get(recordings));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ZoomConfig {
        account_id: "acct-1".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        webhook_secret: None,
        api_base: format!("http://{}/v2", addr),
        oauth_url: format!("http://{}/oauth/token", addr),
    }
}

#[tokio::test]
async fn creates_scheduled_meeting() {
    let client = ZoomClient::new(spawn_fake_zoom().await).unwrap();
    let start = Utc.with_ymd_and_hms(2025, 4, 2, 15, 30, 0).unwrap();

    let meeting = client.create_meeting("Clase 5", start, 60).await.unwrap();
    assert_eq!(meeting.id, 85746065432);
    assert_eq!(meeting.topic, "Clase 5");
    assert_eq!(meeting.start_time, Some(start));
    assert_eq!(meeting.duration, Some(60));
    assert_eq!(meeting.join_url, "https://zoom.us/j/85746065432");
}

#[tokio::test]
async fn zoom_errors_surface_as_upstream() {
    let client = ZoomClient::new(spawn_fake_zoom().await).unwrap();
    let err = client
        .create_meeting("reject me", Utc::now(), 30)
        .await
        .unwrap_err();
    match err {
        Error::Upstream(msg) => assert!(msg.contains("Invalid meeting topic"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn bad_credentials_fail_token_exchange() {
    let mut config = spawn_fake_zoom().await;
    config.account_id = "someone-else".into();
    let client = ZoomClient::new(config).unwrap();
    let err = client.list_recordings(1).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
}

#[tokio::test]
async fn lists_recordings_and_treats_missing_as_empty() {
    let client = ZoomClient::new(spawn_fake_zoom().await).unwrap();

    let found = client.list_recordings(85746065432).await.unwrap();
    assert_eq!(found.recording_files.len(), 1);
    let file = &found.recording_files[0];
    assert_eq!(file.id.as_deref(), Some("rec-1"));
    assert_eq!(file.file_size, Some(1048576));

    let missing = client.list_recordings(404).await.unwrap();
    assert!(missing.recording_files.is_empty());
}
