use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub section: Option<String>,
    pub code: String,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum CourseRole {
    Teacher,
    Student,
}

/// Course as listed for a member, with the caller's role in it.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CourseSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub section: Option<String>,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub role: CourseRole,
    pub member_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CourseMember {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: CourseRole,
    pub joined_at: DateTime<Utc>,
}
