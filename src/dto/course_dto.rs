use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::course::{Course, CourseRole};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCoursePayload {
    #[validate(length(min = 1, max = 120), custom(function = "crate::utils::validation::not_blank"))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 60))]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCoursePayload {
    #[validate(length(min = 1, max = 120), custom(function = "crate::utils::validation::not_blank"))]
    pub name: Option<String>,
    /// An empty string clears it.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// An empty string clears it.
    #[validate(length(max = 60))]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JoinCoursePayload {
    #[validate(length(min = 4, max = 16))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub section: Option<String>,
    /// Only shown to course teachers.
    pub code: Option<String>,
    pub teacher_id: Uuid,
    pub role: CourseRole,
    pub created_at: DateTime<Utc>,
}

impl CourseResponse {
    pub fn new(course: Course, role: CourseRole) -> Self {
        let code = (role == CourseRole::Teacher).then_some(course.code);
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            section: course.section,
            code,
            teacher_id: course.teacher_id,
            role,
            created_at: course.created_at,
        }
    }
}
