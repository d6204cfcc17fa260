use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use validator::Validate;

use crate::services::zoom_service::ZoomRecordingFile;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMeetingPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub topic: String,
    pub start_time: DateTime<Utc>,
    /// Minutes.
    #[validate(range(min = 1, max = 1440))]
    pub duration: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoomWebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: JsonValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlValidationPayload {
    #[serde(rename = "plainToken")]
    pub plain_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlValidationResponse {
    #[serde(rename = "plainToken")]
    pub plain_token: String,
    #[serde(rename = "encryptedToken")]
    pub encrypted_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingCompletedPayload {
    pub object: RecordingObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingObject {
    pub id: i64,
    #[serde(default)]
    pub recording_files: Vec<ZoomRecordingFile>,
}
