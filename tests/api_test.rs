mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use aula_virtual::{routes, utils::signature::hmac_sha256_hex};
use common::{lazy_state, test_config, token_for, JWT_SECRET};

async fn send(app: Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_without_database() {
    let app = routes::router(lazy_state(test_config()));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = routes::router(lazy_state(test_config()));

    let req = Request::builder().uri("/api/courses").body(Body::empty()).unwrap();
    let (status, body) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let req = Request::builder()
        .uri("/api/courses")
        .header("authorization", "Basic abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = token_for(Uuid::new_v4(), "teacher", "some-other-secret");
    let req = Request::builder()
        .uri("/api/courses")
        .header("authorization", format!("Bearer {}", forged))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_the_database() {
    let app = routes::router(lazy_state(test_config()));
    let token = token_for(Uuid::new_v4(), "teacher", JWT_SECRET);
    let req = Request::builder()
        .method("POST")
        .uri("/api/courses")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "   " }).to_string()))
        .unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rate_limit_applies_per_caller() {
    let mut config = test_config();
    config.api_rps = 1;
    let app = routes::router(lazy_state(config));
    let token = token_for(Uuid::new_v4(), "teacher", JWT_SECRET);

    let request = || {
        Request::builder()
            .method("POST")
            .uri("/api/courses")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "" }).to_string()))
            .unwrap()
    };

    let (first, _) = send(app.clone(), request()).await;
    assert_eq!(first, StatusCode::BAD_REQUEST);
    let (second, body) = send(app.clone(), request()).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limit_exceeded");

    let other = token_for(Uuid::new_v4(), "teacher", JWT_SECRET);
    let req = Request::builder()
        .method("POST")
        .uri("/api/courses")
        .header("authorization", format!("Bearer {}", other))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "" }).to_string()))
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_lists_grading_routes() {
    let app = routes::router(lazy_state(test_config()));
    let req = Request::builder()
        .uri("/api/docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().expect("paths");
    assert!(paths.contains_key("/api/evaluations/{id}/submissions"));
    assert!(paths.contains_key("/api/submissions/{id}/grade"));
    assert!(paths.contains_key("/api/courses/{id}/gradebook"));
}

#[tokio::test]
async fn zoom_webhook_is_disabled_without_secret() {
    let app = routes::router(lazy_state(test_config()));
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/zoom")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"event":"endpoint.url_validation","payload":{"plainToken":"x"}}"#))
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zoom_url_validation_answers_signed_challenge() {
    let secret = "whsec_test";
    let mut config = test_config();
    config.zoom.webhook_secret = Some(secret.into());
    let app = routes::router(lazy_state(config));

    let body = json!({
        "event": "endpoint.url_validation",
        "payload": { "plainToken": "qgg8vlvZRS6UYooatFL8Aw" }
    })
    .to_string();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = format!(
        "v0={}",
        hmac_sha256_hex(secret, &format!("v0:{}:{}", timestamp, body)).unwrap()
    );

    let unsigned = Request::builder()
        .method("POST")
        .uri("/api/webhooks/zoom")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(app.clone(), unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/zoom")
        .header("x-zm-request-timestamp", &timestamp)
        .header("x-zm-signature", &signature)
        .body(Body::from(body))
        .unwrap();
    let (status, resp) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["plainToken"], "qgg8vlvZRS6UYooatFL8Aw");
    assert_eq!(
        resp["encryptedToken"],
        hmac_sha256_hex(secret, "qgg8vlvZRS6UYooatFL8Aw").unwrap()
    );
}
