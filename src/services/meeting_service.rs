use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::meeting_dto::{
    CreateMeetingPayload, RecordingCompletedPayload, UrlValidationPayload, UrlValidationResponse,
    ZoomWebhookEvent,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::meeting::{Meeting, MeetingWithRecordings, Recording};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::services::access;
use crate::services::notification_service::NotificationService;
use crate::services::zoom_service::{ZoomClient, ZoomRecordingFile};
use crate::utils::signature::hmac_sha256_hex;

#[derive(Clone)]
pub struct MeetingService {
    pool: PgPool,
    zoom: ZoomClient,
    notifications: NotificationService,
}

/// What a verified webhook call should answer with.
#[derive(Debug)]
pub enum WebhookOutcome {
    Challenge(UrlValidationResponse),
    RecordingsStored(usize),
    Ignored,
}

impl MeetingService {
    pub fn new(pool: PgPool, zoom: ZoomClient, notifications: NotificationService) -> Self {
        Self {
            pool,
            zoom,
            notifications,
        }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        course_id: Uuid,
        payload: CreateMeetingPayload,
    ) -> Result<Meeting> {
        access::require_teacher(&self.pool, course_id, user).await?;
        let topic = payload.topic.trim();
        let zoom_meeting = self
            .zoom
            .create_meeting(topic, payload.start_time, payload.duration)
            .await?;

        let meeting = sqlx::query_as::<_, Meeting>(
            r#"
            INSERT INTO meetings (course_id, zoom_meeting_id, topic, start_time, duration, join_url, start_url, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(zoom_meeting.id)
        .bind(topic)
        .bind(zoom_meeting.start_time.unwrap_or(payload.start_time))
        .bind(zoom_meeting.duration.unwrap_or(payload.duration))
        .bind(&zoom_meeting.join_url)
        .bind(&zoom_meeting.start_url)
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(meeting_id = %meeting.id, %course_id, zoom_meeting_id = meeting.zoom_meeting_id, "meeting scheduled");
        self.notifications
            .announce(NewNotification {
                kind: NotificationKind::Meeting,
                title: format!("New class meeting: {}", meeting.topic),
                body: Some(meeting.start_time.format("%d/%m/%Y %H:%M UTC").to_string()),
                course_id,
                reference_id: Some(meeting.id),
            })
            .await;
        Ok(meeting)
    }

    pub async fn list(&self, user: &AuthUser, course_id: Uuid) -> Result<Vec<MeetingWithRecordings>> {
        access::require_member(&self.pool, course_id, user).await?;
        let meetings = sqlx::query_as::<_, Meeting>(
            r#"SELECT * FROM meetings WHERE course_id = $1 ORDER BY start_time DESC"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let recordings = sqlx::query_as::<_, Recording>(
            r#"
            SELECT r.* FROM recordings r
            JOIN meetings m ON m.id = r.meeting_id
            WHERE m.course_id = $1
            ORDER BY r.recording_start ASC NULLS LAST
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_meeting: HashMap<Uuid, Vec<Recording>> = HashMap::new();
        for r in recordings {
            by_meeting.entry(r.meeting_id).or_default().push(r);
        }
        Ok(meetings
            .into_iter()
            .map(|meeting| MeetingWithRecordings {
                recordings: by_meeting.remove(&meeting.id).unwrap_or_default(),
                meeting,
            })
            .collect())
    }

    pub async fn sync_recordings(&self, user: &AuthUser, meeting_id: Uuid) -> Result<Vec<Recording>> {
        let meeting = self.get_by_id(meeting_id).await?;
        access::require_teacher(&self.pool, meeting.course_id, user).await?;
        let fetched = self.zoom.list_recordings(meeting.zoom_meeting_id).await?;
        self.upsert_recordings(meeting.id, &fetched.recording_files).await
    }

    /// Dispatches an already signature-checked webhook event.
    pub async fn handle_webhook(&self, secret: &str, event: ZoomWebhookEvent) -> Result<WebhookOutcome> {
        match event.event.as_str() {
            "endpoint.url_validation" => {
                let payload: UrlValidationPayload = serde_json::from_value(event.payload)?;
                let encrypted_token = hmac_sha256_hex(secret, &payload.plain_token)
                    .ok_or_else(|| Error::Internal("Invalid webhook secret".into()))?;
                Ok(WebhookOutcome::Challenge(UrlValidationResponse {
                    plain_token: payload.plain_token,
                    encrypted_token,
                }))
            }
            "recording.completed" => {
                let payload: RecordingCompletedPayload = serde_json::from_value(event.payload)?;
                let meeting = sqlx::query_as::<_, Meeting>(
                    r#"SELECT * FROM meetings WHERE zoom_meeting_id = $1"#,
                )
                .bind(payload.object.id)
                .fetch_optional(&self.pool)
                .await?;
                let Some(meeting) = meeting else {
                    tracing::warn!(zoom_meeting_id = payload.object.id, "recording for unknown meeting");
                    return Ok(WebhookOutcome::Ignored);
                };
                let stored = self
                    .upsert_recordings(meeting.id, &payload.object.recording_files)
                    .await?;
                Ok(WebhookOutcome::RecordingsStored(stored.len()))
            }
            other => {
                tracing::debug!(event = other, "zoom webhook event ignored");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn upsert_recordings(&self, meeting_id: Uuid, files: &[ZoomRecordingFile]) -> Result<Vec<Recording>> {
        let mut stored = Vec::with_capacity(files.len());
        let mut tx = self.pool.begin().await?;
        for file in files {
            let Some(zoom_id) = file.id.as_deref() else {
                continue;
            };
            let row = sqlx::query_as::<_, Recording>(
                r#"
                INSERT INTO recordings (
                    meeting_id, zoom_recording_id, file_type, play_url, download_url,
                    recording_start, recording_end, file_size
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (zoom_recording_id) DO UPDATE SET
                    file_type = EXCLUDED.file_type,
                    play_url = EXCLUDED.play_url,
                    download_url = EXCLUDED.download_url,
                    recording_start = EXCLUDED.recording_start,
                    recording_end = EXCLUDED.recording_end,
                    file_size = EXCLUDED.file_size
                RETURNING *
                "#,
            )
            .bind(meeting_id)
            .bind(zoom_id)
            .bind(&file.file_type)
            .bind(&file.play_url)
            .bind(&file.download_url)
            .bind(file.recording_start)
            .bind(file.recording_end)
            .bind(file.file_size)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }
        tx.commit().await?;
        tracing::info!(%meeting_id, recordings = stored.len(), "recordings synced");
        Ok(stored)
    }

    async fn get_by_id(&self, meeting_id: Uuid) -> Result<Meeting> {
        let meeting = sqlx::query_as::<_, Meeting>(r#"SELECT * FROM meetings WHERE id = $1"#)
            .bind(meeting_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Meeting not found".into()))?;
        Ok(meeting)
    }
}
