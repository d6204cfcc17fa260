use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::evaluation::{Evaluation, EvaluationStatus};
use crate::models::question::{AnswerValue, Question, QuestionType, StudentQuestion};
use crate::models::submission::Submission;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateQuestion {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 4000), custom(function = "crate::utils::validation::not_blank"))]
    pub prompt: String,
    #[validate(range(min = 0, max = 1000))]
    #[serde(default = "default_points")]
    pub points: i32,
    #[serde(default)]
    pub options: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub correct_answer: Option<JsonValue>,
}

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEvaluationPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<CreateQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEvaluationPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub title: Option<String>,
    /// An empty string clears it.
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EvaluationSummary {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: EvaluationStatus,
    pub question_count: i64,
    pub total_points: i64,
    /// Present for students only.
    pub submitted: Option<bool>,
    pub score: Option<i32>,
}

/// Questions as the caller may see them: teachers get the answer key.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QuestionsView {
    WithKey(Vec<Question>),
    WithoutKey(Vec<StudentQuestion>),
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub status: EvaluationStatus,
    pub total_points: i32,
    pub questions: QuestionsView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitAnswer {
    pub question_id: Uuid,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub answer: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitEvaluationPayload {
    #[validate(length(max = 200))]
    pub answers: Vec<SubmitAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitEvaluationResponse {
    pub submission_id: Uuid,
    pub score: i32,
    pub total_points: i32,
    pub pending_review: usize,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GradeAnswerPayload {
    pub question_id: Uuid,
    #[validate(range(min = 0))]
    pub points_earned: i32,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewAnswerView {
    pub question_id: Uuid,
    pub position: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: i32,
    pub options: Vec<String>,
    pub correct_answer: Option<AnswerValue>,
    pub answer: Option<AnswerValue>,
    pub is_correct: Option<bool>,
    pub points_earned: i32,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReview {
    pub submission: Submission,
    pub student_name: String,
    pub evaluation_title: String,
    pub answers: Vec<ReviewAnswerView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadedAnswerFile {
    pub path: String,
    pub name: String,
    pub size_bytes: i64,
}
