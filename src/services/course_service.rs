use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::course_dto::{CreateCoursePayload, UpdateCoursePayload};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::course::{Course, CourseMember, CourseRole, CourseSummary};
use crate::services::access;
use crate::services::profile_service::ProfileService;
use crate::utils::token::{generate_course_code, normalize_course_code};

const CODE_LENGTH: usize = 8;
const CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct CourseService {
    pool: PgPool,
    profiles: ProfileService,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        let profiles = ProfileService::new(pool.clone());
        Self { pool, profiles }
    }

    pub async fn create(&self, user: &AuthUser, payload: CreateCoursePayload) -> Result<Course> {
        if !user.role.can_create_courses() {
            return Err(Error::Forbidden("Only teachers can create courses".into()));
        }
        self.profiles.ensure(user).await?;

        for _ in 0..CODE_ATTEMPTS {
            let code = generate_course_code(CODE_LENGTH);
            let mut tx = self.pool.begin().await?;
            let inserted = sqlx::query_as::<_, Course>(
                r#"
                INSERT INTO courses (name, description, section, code, teacher_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (code) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(payload.name.trim())
            .bind(&payload.description)
            .bind(&payload.section)
            .bind(&code)
            .bind(user.id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(course) = inserted else {
                tracing::debug!(%code, "course code collision, retrying");
                continue;
            };

            sqlx::query(
                r#"INSERT INTO course_members (course_id, user_id, role) VALUES ($1, $2, 'teacher')"#,
            )
            .bind(course.id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            tracing::info!(course_id = %course.id, teacher_id = %user.id, "course created");
            return Ok(course);
        }

        Err(Error::Internal("Could not allocate a unique course code".into()))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CourseSummary>> {
        let rows = sqlx::query_as::<_, CourseSummary>(
            r#"
            SELECT
                c.id, c.name, c.description, c.section, c.teacher_id,
                t.full_name AS teacher_name,
                m.role,
                (SELECT COUNT(*) FROM course_members cm WHERE cm.course_id = c.id) AS member_count
            FROM course_members m
            JOIN courses c ON c.id = m.course_id
            JOIN profiles t ON t.id = c.teacher_id
            WHERE m.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, user: &AuthUser, course_id: Uuid) -> Result<(Course, CourseRole)> {
        let role = access::require_member(&self.pool, course_id, user).await?;
        let course = self.get_by_id(course_id).await?;
        Ok((course, role))
    }

    pub async fn get_by_id(&self, course_id: Uuid) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(r#"SELECT * FROM courses WHERE id = $1"#)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(course)
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        course_id: Uuid,
        payload: UpdateCoursePayload,
    ) -> Result<Course> {
        access::require_teacher(&self.pool, course_id, user).await?;
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET name = COALESCE($2, name),
                description = CASE WHEN $3::text IS NULL THEN description ELSE NULLIF(BTRIM($3), '') END,
                section = CASE WHEN $4::text IS NULL THEN section ELSE NULLIF(BTRIM($4), '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(&payload.description)
        .bind(&payload.section)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn delete(&self, user: &AuthUser, course_id: Uuid) -> Result<()> {
        access::require_teacher(&self.pool, course_id, user).await?;
        sqlx::query(r#"DELETE FROM courses WHERE id = $1"#)
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        tracing::info!(%course_id, user_id = %user.id, "course deleted");
        Ok(())
    }

    pub async fn regenerate_code(&self, user: &AuthUser, course_id: Uuid) -> Result<Course> {
        access::require_teacher(&self.pool, course_id, user).await?;
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_course_code(CODE_LENGTH);
            let updated = sqlx::query_as::<_, Course>(
                r#"
                UPDATE courses SET code = $2, updated_at = NOW()
                WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM courses WHERE code = $2)
                RETURNING *
                "#,
            )
            .bind(course_id)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(course) = updated {
                return Ok(course);
            }
        }
        Err(Error::Internal("Could not allocate a unique course code".into()))
    }

    /// Enrolls the caller as a student of the course owning `code`.
    pub async fn join(&self, user: &AuthUser, code: &str) -> Result<Course> {
        let code = normalize_course_code(code);
        let course = sqlx::query_as::<_, Course>(r#"SELECT * FROM courses WHERE code = $1"#)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::BadRequest("The code does not match any course".into()))?;

        self.profiles.ensure(user).await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO course_members (course_id, user_id, role)
            VALUES ($1, $2, 'student')
            ON CONFLICT (course_id, user_id) DO NOTHING
            "#,
        )
        .bind(course.id)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(Error::Conflict("Already enrolled in this course".into()));
        }
        tracing::info!(course_id = %course.id, student_id = %user.id, "student joined course");
        Ok(course)
    }

    pub async fn members(&self, user: &AuthUser, course_id: Uuid) -> Result<Vec<CourseMember>> {
        access::require_member(&self.pool, course_id, user).await?;
        let rows = sqlx::query_as::<_, CourseMember>(
            r#"
            SELECT m.user_id, p.full_name, p.email, m.role, m.joined_at
            FROM course_members m
            JOIN profiles p ON p.id = m.user_id
            WHERE m.course_id = $1
            ORDER BY m.role DESC, p.full_name ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Teachers may remove anyone but the owner; students may only remove themselves.
    pub async fn remove_member(&self, user: &AuthUser, course_id: Uuid, member_id: Uuid) -> Result<()> {
        let role = access::require_member(&self.pool, course_id, user).await?;
        if role == CourseRole::Student && member_id != user.id {
            return Err(Error::Forbidden("Students can only leave a course themselves".into()));
        }
        let course = self.get_by_id(course_id).await?;
        if course.teacher_id == member_id {
            return Err(Error::BadRequest("The course owner cannot be removed".into()));
        }

        let result = sqlx::query(r#"DELETE FROM course_members WHERE course_id = $1 AND user_id = $2"#)
            .bind(course_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Member not found".into()));
        }
        Ok(())
    }
}
