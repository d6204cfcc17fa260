use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::course::CourseRole;
use crate::models::gradebook::{Gradebook, GradebookColumn, GradebookScore, GradebookStudent};
use crate::services::access;

#[derive(Clone)]
pub struct GradebookService {
    pool: PgPool,
}

impl GradebookService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Teachers get every student; students only their own row.
    pub async fn for_course(&self, user: &AuthUser, course_id: Uuid) -> Result<Gradebook> {
        let role = access::require_member(&self.pool, course_id, user).await?;
        let mut book = self.load(course_id).await?;
        if role == CourseRole::Student {
            book.retain_student(user.id);
        }
        Ok(book)
    }

    pub async fn export_for_teacher(&self, user: &AuthUser, course_id: Uuid) -> Result<Gradebook> {
        access::require_teacher(&self.pool, course_id, user).await?;
        self.load(course_id).await
    }

    async fn load(&self, course_id: Uuid) -> Result<Gradebook> {
        let columns = sqlx::query_as::<_, GradebookColumn>(
            r#"
            SELECT
                e.id AS evaluation_id, e.title, e.start_date,
                COALESCE((SELECT SUM(q.points) FROM questions q WHERE q.evaluation_id = e.id), 0)::bigint AS total_points
            FROM evaluations e
            WHERE e.course_id = $1
            ORDER BY e.start_date ASC, e.created_at ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let students = sqlx::query_as::<_, GradebookStudent>(
            r#"
            SELECT p.id AS student_id, p.full_name, p.email
            FROM course_members m
            JOIN profiles p ON p.id = m.user_id
            WHERE m.course_id = $1 AND m.role = 'student'
            ORDER BY p.full_name ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let scores = sqlx::query_as::<_, GradebookScore>(
            r#"
            SELECT s.evaluation_id, s.student_id, s.score, s.total_points, s.graded_at
            FROM submissions s
            JOIN evaluations e ON e.id = s.evaluation_id
            WHERE e.course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            %course_id,
            evaluations = columns.len(),
            students = students.len(),
            submissions = scores.len(),
            "gradebook loaded"
        );
        Ok(Gradebook::build(course_id, columns, students, scores))
    }
}
