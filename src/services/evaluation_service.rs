use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::evaluation_dto::{
    CreateEvaluationPayload, CreateQuestion, EvaluationDetail, EvaluationSummary, QuestionsView,
    UpdateEvaluationPayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::course::CourseRole;
use crate::models::evaluation::{Evaluation, EvaluationStatus};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::question::{AnswerValue, Question, QuestionRow, QuestionType, StudentQuestion};
use crate::services::access;
use crate::services::notification_service::NotificationService;

#[derive(Clone)]
pub struct EvaluationService {
    pool: PgPool,
    notifications: NotificationService,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    question_count: i64,
    total_points: i64,
    submission_score: Option<i32>,
    has_submission: bool,
}

impl EvaluationService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self { pool, notifications }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        course_id: Uuid,
        payload: CreateEvaluationPayload,
    ) -> Result<EvaluationDetail> {
        access::require_teacher(&self.pool, course_id, user).await?;
        check_window(payload.start_date, payload.end_date)?;
        let keys = payload
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                check_question(q).map_err(|e| match e {
                    Error::BadRequest(msg) => Error::BadRequest(format!("Question {}: {}", idx + 1, msg)),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.pool.begin().await?;
        let evaluation = sqlx::query_as::<_, Evaluation>(
            r#"
            INSERT INTO evaluations (course_id, title, description, start_date, end_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(payload.title.trim())
        .bind(&payload.description)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(payload.questions.len());
        for (position, (q, key)) in payload.questions.iter().zip(keys).enumerate() {
            let row = sqlx::query_as::<_, QuestionRow>(
                r#"
                INSERT INTO questions (evaluation_id, position, question_type, prompt, points, options, correct_answer)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(evaluation.id)
            .bind(position as i32)
            .bind(q.question_type)
            .bind(q.prompt.trim())
            .bind(q.points)
            .bind(sqlx::types::Json(&q.options))
            .bind(key.as_ref().map(AnswerValue::to_json))
            .fetch_one(&mut *tx)
            .await?;
            questions.push(Question::try_from(row)?);
        }
        tx.commit().await?;

        tracing::info!(
            evaluation_id = %evaluation.id,
            %course_id,
            questions = questions.len(),
            "evaluation created"
        );

        self.notifications
            .announce(NewNotification {
                kind: NotificationKind::Evaluation,
                title: format!("New evaluation: {}", evaluation.title),
                body: Some(format!(
                    "Available from {} to {}",
                    evaluation.start_date.format("%d/%m/%Y %H:%M"),
                    evaluation.end_date.format("%d/%m/%Y %H:%M")
                )),
                course_id,
                reference_id: Some(evaluation.id),
            })
            .await;

        Ok(detail(evaluation, questions, true, Utc::now()))
    }

    pub async fn list(&self, user: &AuthUser, course_id: Uuid) -> Result<Vec<EvaluationSummary>> {
        let role = access::require_member(&self.pool, course_id, user).await?;
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                e.id, e.course_id, e.title, e.description, e.start_date, e.end_date,
                (SELECT COUNT(*) FROM questions q WHERE q.evaluation_id = e.id) AS question_count,
                (SELECT COALESCE(SUM(q.points), 0)::bigint FROM questions q WHERE q.evaluation_id = e.id) AS total_points,
                s.score AS submission_score,
                (s.id IS NOT NULL) AS has_submission
            FROM evaluations e
            LEFT JOIN submissions s ON s.evaluation_id = e.id AND s.student_id = $2
            WHERE e.course_id = $1
            ORDER BY e.start_date DESC
            "#,
        )
        .bind(course_id)
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let is_student = role == CourseRole::Student;
        Ok(rows
            .into_iter()
            .map(|r| EvaluationSummary {
                id: r.id,
                course_id: r.course_id,
                title: r.title,
                description: r.description,
                status: EvaluationStatus::classify(r.start_date, r.end_date, now),
                start_date: r.start_date,
                end_date: r.end_date,
                question_count: r.question_count,
                total_points: r.total_points,
                submitted: is_student.then_some(r.has_submission),
                score: if is_student { r.submission_score } else { None },
            })
            .collect())
    }

    pub async fn get(&self, user: &AuthUser, evaluation_id: Uuid) -> Result<EvaluationDetail> {
        let evaluation = self.get_by_id(evaluation_id).await?;
        let role = access::require_member(&self.pool, evaluation.course_id, user).await?;
        let now = Utc::now();
        if role == CourseRole::Student && evaluation.status_at(now) == EvaluationStatus::Upcoming {
            return Err(Error::Forbidden("This evaluation has not started yet".into()));
        }
        let questions = self.load_questions(evaluation_id).await?;
        Ok(detail(evaluation, questions, role == CourseRole::Teacher, now))
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        evaluation_id: Uuid,
        payload: UpdateEvaluationPayload,
    ) -> Result<Evaluation> {
        let current = self.get_by_id(evaluation_id).await?;
        access::require_teacher(&self.pool, current.course_id, user).await?;
        let start = payload.start_date.unwrap_or(current.start_date);
        let end = payload.end_date.unwrap_or(current.end_date);
        check_window(start, end)?;

        let evaluation = sqlx::query_as::<_, Evaluation>(
            r#"
            UPDATE evaluations
            SET title = COALESCE($2, title),
                description = CASE WHEN $3::text IS NULL THEN description ELSE NULLIF(BTRIM($3), '') END,
                start_date = $4,
                end_date = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(evaluation_id)
        .bind(payload.title.as_deref().map(str::trim))
        .bind(&payload.description)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(evaluation)
    }

    pub async fn delete(&self, user: &AuthUser, evaluation_id: Uuid) -> Result<()> {
        let evaluation = self.get_by_id(evaluation_id).await?;
        access::require_teacher(&self.pool, evaluation.course_id, user).await?;
        sqlx::query(r#"DELETE FROM evaluations WHERE id = $1"#)
            .bind(evaluation_id)
            .execute(&self.pool)
            .await?;
        tracing::info!(%evaluation_id, user_id = %user.id, "evaluation deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, evaluation_id: Uuid) -> Result<Evaluation> {
        let evaluation = sqlx::query_as::<_, Evaluation>(r#"SELECT * FROM evaluations WHERE id = $1"#)
            .bind(evaluation_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Evaluation not found".into()))?;
        Ok(evaluation)
    }

    pub async fn load_questions(&self, evaluation_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions WHERE evaluation_id = $1 ORDER BY position ASC"#,
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Question::try_from).collect()
    }
}

fn detail(
    evaluation: Evaluation,
    questions: Vec<Question>,
    with_key: bool,
    now: DateTime<Utc>,
) -> EvaluationDetail {
    let total_points = questions.iter().map(|q| q.points).sum();
    let questions = if with_key {
        QuestionsView::WithKey(questions)
    } else {
        QuestionsView::WithoutKey(questions.iter().map(StudentQuestion::from).collect())
    };
    EvaluationDetail {
        status: evaluation.status_at(now),
        evaluation,
        total_points,
        questions,
    }
}

pub fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start >= end {
        return Err(Error::BadRequest("start_date must be before end_date".into()));
    }
    Ok(())
}

/// Validates a question definition and returns its typed answer key.
pub fn check_question(q: &CreateQuestion) -> Result<Option<AnswerValue>> {
    let key = match &q.correct_answer {
        Some(raw) => AnswerValue::from_json(q.question_type, raw)?,
        None => None,
    };

    if q.question_type.has_options() {
        if q.options.len() < 2 {
            return Err(Error::BadRequest("Choice questions need at least two options".into()));
        }
        if q.options.iter().any(|o| o.trim().is_empty()) {
            return Err(Error::BadRequest("Options must not be blank".into()));
        }
    }

    match (&key, q.question_type) {
        (Some(AnswerValue::MultipleChoice(choice)), QuestionType::MultipleChoice)
            if !choice.is_empty() && !q.options.contains(choice) =>
        {
            Err(Error::BadRequest(format!("Correct answer '{}' is not an option", choice)))
        }
        (Some(AnswerValue::MultipleSelect(choices)), QuestionType::MultipleSelect) => {
            match choices.iter().find(|c| !q.options.contains(c)) {
                Some(missing) => Err(Error::BadRequest(format!(
                    "Correct answer '{}' is not an option",
                    missing
                ))),
                None => Ok(key),
            }
        }
        _ => Ok(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(question_type: QuestionType, options: &[&str], key: serde_json::Value) -> CreateQuestion {
        CreateQuestion {
            question_type,
            prompt: "¿?".into(),
            points: 2,
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: Some(key),
        }
    }

    #[test]
    fn choice_key_must_be_an_option() {
        let q = create(QuestionType::MultipleChoice, &["a", "b"], json!("c"));
        assert!(check_question(&q).is_err());
        let q = create(QuestionType::MultipleSelect, &["a", "b"], json!(["a", "z"]));
        assert!(check_question(&q).is_err());
        let q = create(QuestionType::MultipleSelect, &["a", "b"], json!(["b", "a"]));
        assert!(check_question(&q).unwrap().is_some());
    }

    #[test]
    fn choice_questions_need_options() {
        let q = create(QuestionType::MultipleChoice, &["solo"], json!("solo"));
        assert!(check_question(&q).is_err());
    }

    #[test]
    fn open_questions_accept_reference_answers() {
        let q = create(QuestionType::ShortAnswer, &[], json!("Lima"));
        assert_eq!(
            check_question(&q).unwrap(),
            Some(AnswerValue::ShortAnswer("Lima".into()))
        );
    }

    #[test]
    fn window_must_be_ordered() {
        let now = Utc::now();
        assert!(check_window(now, now).is_err());
        assert!(check_window(now, now + chrono::Duration::minutes(1)).is_ok());
    }
}
