use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::question::QuestionType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub student_id: Uuid,
    pub score: i32,
    pub total_points: i32,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Answer {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub question_id: Uuid,
    pub answer: Option<JsonValue>,
    pub is_correct: Option<bool>,
    pub points_earned: i32,
}

/// One answer joined with its question, as used by the review screen.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewedAnswer {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub position: i32,
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: i32,
    pub options: sqlx::types::Json<Vec<String>>,
    pub correct_answer: Option<JsonValue>,
    pub answer: Option<JsonValue>,
    pub is_correct: Option<bool>,
    pub points_earned: i32,
}

/// Submission row joined with the student's name for teacher listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SubmissionListItem {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub score: i32,
    pub total_points: i32,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
    pub pending_review: i64,
}
