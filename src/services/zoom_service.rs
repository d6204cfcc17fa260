use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ZoomConfig;
use crate::error::{Error, Result};
use crate::utils::time::to_zoom_time;

/// Scheduled meeting, as opposed to instant (1) or recurring (3, 8).
const SCHEDULED_MEETING: u8 = 2;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CreateMeetingRequest<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    meeting_type: u8,
    start_time: String,
    duration: i32,
    timezone: &'a str,
    settings: MeetingSettings,
}

#[derive(Debug, Serialize)]
struct MeetingSettings {
    join_before_host: bool,
    waiting_room: bool,
    auto_recording: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoomMeeting {
    pub id: i64,
    pub topic: String,
    pub start_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub join_url: String,
    pub start_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomRecordingFile {
    pub id: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub play_url: Option<String>,
    pub download_url: Option<String>,
    pub recording_start: Option<DateTime<Utc>>,
    pub recording_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoomRecordings {
    #[serde(default)]
    pub recording_files: Vec<ZoomRecordingFile>,
}

#[derive(Debug, Deserialize)]
struct ZoomErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Server-to-server OAuth client for the Zoom REST API.
///
/// Every call performs its own token exchange.
#[derive(Clone)]
pub struct ZoomClient {
    client: Client,
    config: ZoomConfig,
}

impl ZoomClient {
    pub fn new(config: ZoomConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(20)).build()?;
        Ok(Self { client, config })
    }

    async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .post(&self.config.oauth_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.config.account_id.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "zoom token exchange failed");
            return Err(Error::Upstream(format!("Zoom authentication failed ({})", status)));
        }
        let token = response.json::<TokenResponse>().await?;
        Ok(token.access_token)
    }

    pub async fn create_meeting(
        &self,
        topic: &str,
        start_time: DateTime<Utc>,
        duration: i32,
    ) -> Result<ZoomMeeting> {
        let token = self.access_token().await?;
        let url = format!("{}/users/me/meetings", self.config.api_base);
        let body = CreateMeetingRequest {
            topic,
            meeting_type: SCHEDULED_MEETING,
            start_time: to_zoom_time(start_time),
            duration,
            timezone: "UTC",
            settings: MeetingSettings {
                join_before_host: false,
                waiting_room: true,
                auto_recording: "cloud",
            },
        };

        let response = self.client.post(&url).bearer_auth(token).json(&body).send().await?;
        let response = check(response).await?;
        let meeting = response.json::<ZoomMeeting>().await?;
        tracing::info!(zoom_meeting_id = meeting.id, "zoom meeting created");
        Ok(meeting)
    }

    /// Recordings of a meeting. A meeting without recordings yields an empty list.
    pub async fn list_recordings(&self, zoom_meeting_id: i64) -> Result<ZoomRecordings> {
        let token = self.access_token().await?;
        let url = format!("{}/meetings/{}/recordings", self.config.api_base, zoom_meeting_id);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(zoom_meeting_id, "no recordings on zoom yet");
            return Ok(ZoomRecordings::default());
        }
        let response = check(response).await?;
        Ok(response.json::<ZoomRecordings>().await?)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ZoomErrorBody>(&text)
        .ok()
        .and_then(|b| match (b.code, b.message) {
            (Some(code), Some(msg)) => Some(format!("{} (code {})", msg, code)),
            (None, Some(msg)) => Some(msg),
            _ => None,
        })
        .unwrap_or_else(|| status.to_string());
    tracing::error!(%status, body = text, "zoom request failed");
    Err(Error::Upstream(format!("Zoom request failed: {}", message)))
}
