use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub course_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Post,
    Material,
    Evaluation,
    Grade,
    Meeting,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Post => "post",
            NotificationKind::Material => "material",
            NotificationKind::Evaluation => "evaluation",
            NotificationKind::Grade => "grade",
            NotificationKind::Meeting => "meeting",
        }
    }
}

pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub course_id: Uuid,
    pub reference_id: Option<Uuid>,
}
