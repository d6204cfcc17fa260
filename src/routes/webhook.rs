use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde_json::{json, Value as JsonValue};

use crate::{
    dto::meeting_dto::ZoomWebhookEvent,
    error::{Error, Result},
    services::meeting_service::WebhookOutcome,
    utils::signature::verify_zoom_signature,
    AppState,
};

/// Requests older than this are rejected as replays.
const MAX_SKEW_SECS: i64 = 300;

/// Zoom event notifications: URL validation and recording completion.
pub async fn handle_zoom_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let Some(secret) = state.config.zoom.webhook_secret.as_deref() else {
        return Err(Error::NotFound("Zoom webhook is not configured".into()));
    };
    verify_signature(secret, &headers, &body, chrono::Utc::now().timestamp())?;

    let event: ZoomWebhookEvent = serde_json::from_str(&body)?;
    tracing::info!(event = %event.event, "zoom webhook received");

    match state.meeting_service.handle_webhook(secret, event).await? {
        WebhookOutcome::Challenge(response) => Ok((StatusCode::OK, Json(json!(response)))),
        WebhookOutcome::RecordingsStored(count) => {
            Ok((StatusCode::OK, Json(json!({ "stored": count }))))
        }
        WebhookOutcome::Ignored => Ok((StatusCode::OK, Json(json!({ "ignored": true })))),
    }
}

pub(crate) fn verify_signature(secret: &str, headers: &HeaderMap, body: &str, now: i64) -> Result<()> {
    let Some(signature) = headers.get("x-zm-signature") else {
        return Err(Error::Unauthorized("missing_signature".into()));
    };
    let Some(timestamp) = headers.get("x-zm-request-timestamp") else {
        return Err(Error::Unauthorized("missing_timestamp".into()));
    };
    let signature = signature
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_signature_header".into()))?;
    let timestamp = timestamp
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_timestamp_header".into()))?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| Error::Unauthorized("invalid_timestamp_header".into()))?;
    if (now - ts).abs() > MAX_SKEW_SECS {
        return Err(Error::Unauthorized("stale_request".into()));
    }

    if verify_zoom_signature(secret, timestamp, body, signature) {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_signature".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::signature::hmac_sha256_hex;
    use axum::http::HeaderValue;

    fn headers(ts: i64, body: &str, secret: &str) -> HeaderMap {
        let sig = hmac_sha256_hex(secret, &format!("v0:{}:{}", ts, body)).unwrap();
        let mut h = HeaderMap::new();
        h.insert("x-zm-request-timestamp", HeaderValue::from_str(&ts.to_string()).unwrap());
        h.insert("x-zm-signature", HeaderValue::from_str(&format!("v0={}", sig)).unwrap());
        h
    }

    #[test]
    fn accepts_fresh_signed_requests() {
        let body = r#"{"event":"recording.completed"}"#;
        assert!(verify_signature("s", &headers(1_000, body, "s"), body, 1_010).is_ok());
    }

    #[test]
    fn rejects_stale_or_forged_requests() {
        let body = r#"{"event":"recording.completed"}"#;
        assert!(verify_signature("s", &headers(1_000, body, "s"), body, 2_000).is_err());
        assert!(verify_signature("s", &headers(1_000, body, "other"), body, 1_000).is_err());
        assert!(verify_signature("s", &HeaderMap::new(), body, 1_000).is_err());
    }
}
