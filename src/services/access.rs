//! Course-scoped authorization shared by the services.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::course::CourseRole;
use crate::models::user::UserRole;

pub async fn member_role(pool: &PgPool, course_id: Uuid, user: &AuthUser) -> Result<Option<CourseRole>> {
    if user.role == UserRole::Admin {
        return Ok(Some(CourseRole::Teacher));
    }
    let role: Option<CourseRole> = sqlx::query_scalar(
        r#"SELECT role FROM course_members WHERE course_id = $1 AND user_id = $2"#,
    )
    .bind(course_id)
    .bind(user.id)
    .fetch_optional(pool)
    .await?;
    Ok(role)
}

/// Any member of the course. Non-members get a 404 so course ids do not leak.
pub async fn require_member(pool: &PgPool, course_id: Uuid, user: &AuthUser) -> Result<CourseRole> {
    member_role(pool, course_id, user)
        .await?
        .ok_or_else(|| Error::NotFound("Course not found".into()))
}

pub async fn require_teacher(pool: &PgPool, course_id: Uuid, user: &AuthUser) -> Result<()> {
    match require_member(pool, course_id, user).await? {
        CourseRole::Teacher => Ok(()),
        CourseRole::Student => Err(Error::Forbidden("Only course teachers can do this".into())),
    }
}

pub async fn require_student(pool: &PgPool, course_id: Uuid, user: &AuthUser) -> Result<()> {
    match require_member(pool, course_id, user).await? {
        CourseRole::Student => Ok(()),
        CourseRole::Teacher => Err(Error::Forbidden("Only enrolled students can do this".into())),
    }
}
