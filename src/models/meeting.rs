use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Meeting {
    pub id: Uuid,
    pub course_id: Uuid,
    pub zoom_meeting_id: i64,
    pub topic: String,
    pub start_time: DateTime<Utc>,
    pub duration: i32,
    pub join_url: String,
    pub start_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Recording {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub zoom_recording_id: String,
    pub file_type: Option<String>,
    pub play_url: Option<String>,
    pub download_url: Option<String>,
    pub recording_start: Option<DateTime<Utc>>,
    pub recording_end: Option<DateTime<Utc>>,
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingWithRecordings {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub recordings: Vec<Recording>,
}
