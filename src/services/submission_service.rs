use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::evaluation_dto::{
    GradeAnswerPayload, ReviewAnswerView, SubmissionReview, SubmitAnswer,
    SubmitEvaluationResponse, UploadedAnswerFile,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::course::CourseRole;
use crate::models::evaluation::{Evaluation, EvaluationStatus};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::question::{AnswerValue, Question, QuestionType};
use crate::models::submission::{Answer, ReviewedAnswer, Submission, SubmissionListItem};
use crate::services::access;
use crate::services::evaluation_service::EvaluationService;
use crate::services::grading_service::GradingService;
use crate::services::notification_service::NotificationService;
use crate::services::storage_service::{sanitize_file_name, StorageService};

#[derive(Clone)]
pub struct SubmissionService {
    pool: PgPool,
    evaluations: EvaluationService,
    storage: StorageService,
    notifications: NotificationService,
}

impl SubmissionService {
    pub fn new(
        pool: PgPool,
        evaluations: EvaluationService,
        storage: StorageService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            evaluations,
            storage,
            notifications,
        }
    }

    pub async fn submit(
        &self,
        user: &AuthUser,
        evaluation_id: Uuid,
        answers: Vec<SubmitAnswer>,
    ) -> Result<SubmitEvaluationResponse> {
        self.submit_at(user, evaluation_id, answers, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        user: &AuthUser,
        evaluation_id: Uuid,
        answers: Vec<SubmitAnswer>,
        now: DateTime<Utc>,
    ) -> Result<SubmitEvaluationResponse> {
        let evaluation = self.evaluations.get_by_id(evaluation_id).await?;
        access::require_student(&self.pool, evaluation.course_id, user).await?;

        let status = evaluation.status_at(now);
        if !status.accepts_submissions() {
            return Err(Error::BadRequest(format!(
                "The evaluation is not open for submissions ({})",
                status.label()
            )));
        }

        let questions = self.evaluations.load_questions(evaluation_id).await?;
        let given = prepare_answers(&questions, answers, &upload_prefix(evaluation_id, user.id))?;
        let summary = GradingService::score_submission(questions.iter().zip(given));

        let mut tx = self.pool.begin().await?;
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (evaluation_id, student_id, score, total_points, submitted_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (evaluation_id, student_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(evaluation_id)
        .bind(user.id)
        .bind(summary.earned)
        .bind(summary.total)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Conflict("You already submitted this evaluation".into()))?;

        for graded in &summary.answers {
            sqlx::query(
                r#"
                INSERT INTO answers (submission_id, question_id, answer, is_correct, points_earned)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(submission.id)
            .bind(graded.question_id)
            .bind(graded.answer.as_ref().map(AnswerValue::to_json))
            .bind(graded.is_correct)
            .bind(graded.points_earned)
            .execute(&mut *tx)
            .await?;
        }

        if summary.pending_review() == 0 {
            sqlx::query(r#"UPDATE submissions SET graded_at = $2 WHERE id = $1"#)
                .bind(submission.id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(
            submission_id = %submission.id,
            %evaluation_id,
            student_id = %user.id,
            score = summary.earned,
            total = summary.total,
            pending_review = summary.pending_review(),
            "submission scored"
        );

        Ok(SubmitEvaluationResponse {
            submission_id: submission.id,
            score: summary.earned,
            total_points: summary.total,
            pending_review: summary.pending_review(),
            submitted_at: submission.submitted_at,
        })
    }

    /// The caller's own submission for an evaluation, if any.
    pub async fn mine(&self, user: &AuthUser, evaluation_id: Uuid) -> Result<Option<Submission>> {
        let evaluation = self.evaluations.get_by_id(evaluation_id).await?;
        access::require_member(&self.pool, evaluation.course_id, user).await?;
        let submission = sqlx::query_as::<_, Submission>(
            r#"SELECT * FROM submissions WHERE evaluation_id = $1 AND student_id = $2"#,
        )
        .bind(evaluation_id)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(submission)
    }

    pub async fn list(&self, user: &AuthUser, evaluation_id: Uuid) -> Result<Vec<SubmissionListItem>> {
        let evaluation = self.evaluations.get_by_id(evaluation_id).await?;
        access::require_teacher(&self.pool, evaluation.course_id, user).await?;
        let rows = sqlx::query_as::<_, SubmissionListItem>(
            r#"
            SELECT
                s.id, s.student_id, p.full_name AS student_name,
                s.score, s.total_points, s.submitted_at, s.graded_at,
                (SELECT COUNT(*) FROM answers a WHERE a.submission_id = s.id AND a.is_correct IS NULL) AS pending_review
            FROM submissions s
            JOIN profiles p ON p.id = s.student_id
            WHERE s.evaluation_id = $1
            ORDER BY p.full_name ASC
            "#,
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn review(&self, user: &AuthUser, submission_id: Uuid) -> Result<SubmissionReview> {
        let submission = self.get_by_id(submission_id).await?;
        let evaluation = self.evaluations.get_by_id(submission.evaluation_id).await?;
        let role = access::require_member(&self.pool, evaluation.course_id, user).await?;
        if role == CourseRole::Student && submission.student_id != user.id {
            return Err(Error::Forbidden("You can only review your own submission".into()));
        }

        let student_name: String =
            sqlx::query_scalar(r#"SELECT full_name FROM profiles WHERE id = $1"#)
                .bind(submission.student_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, ReviewedAnswer>(
            r#"
            SELECT
                a.id AS answer_id, q.id AS question_id, q.position, q.question_type, q.prompt,
                q.points, q.options, q.correct_answer, a.answer, a.is_correct, a.points_earned
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.submission_id = $1
            ORDER BY q.position ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        let show_key = role == CourseRole::Teacher
            || evaluation.status_at(Utc::now()) == EvaluationStatus::Finished;
        let answers = rows
            .into_iter()
            .map(|row| review_view(row, show_key))
            .collect::<Result<Vec<_>>>()?;

        Ok(SubmissionReview {
            submission,
            student_name,
            evaluation_title: evaluation.title,
            answers,
        })
    }

    pub async fn grade_answer(
        &self,
        user: &AuthUser,
        submission_id: Uuid,
        payload: GradeAnswerPayload,
    ) -> Result<Submission> {
        let submission = self.get_by_id(submission_id).await?;
        let was_graded = submission.graded_at.is_some();
        let evaluation = self.evaluations.get_by_id(submission.evaluation_id).await?;
        access::require_teacher(&self.pool, evaluation.course_id, user).await?;

        let max_points: i32 = sqlx::query_scalar(
            r#"SELECT points FROM questions WHERE id = $1 AND evaluation_id = $2"#,
        )
        .bind(payload.question_id)
        .bind(evaluation.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found in this evaluation".into()))?;

        check_manual_points(payload.points_earned, max_points)?;
        let is_correct = payload
            .is_correct
            .unwrap_or(payload.points_earned == max_points);

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            r#"
            UPDATE answers SET points_earned = $3, is_correct = $4
            WHERE submission_id = $1 AND question_id = $2
            "#,
        )
        .bind(submission_id)
        .bind(payload.question_id)
        .bind(payload.points_earned)
        .bind(is_correct)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound("Answer not found".into()));
        }

        let answers = sqlx::query_as::<_, Answer>(r#"SELECT * FROM answers WHERE submission_id = $1"#)
            .bind(submission_id)
            .fetch_all(&mut *tx)
            .await?;
        let score = GradingService::recompute_score(&answers);
        let pending = answers.iter().filter(|a| a.is_correct.is_none()).count();

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET score = $2,
                graded_at = CASE WHEN $3 THEN COALESCE(graded_at, NOW()) ELSE graded_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(submission_id)
        .bind(score)
        .bind(pending == 0)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            %submission_id,
            question_id = %payload.question_id,
            points = payload.points_earned,
            score,
            pending,
            "answer graded"
        );

        if completes_grading(was_graded, pending) {
            self.notifications
                .announce_to(
                    submission.student_id,
                    NewNotification {
                        kind: NotificationKind::Grade,
                        title: format!("Your grade for {} is ready", evaluation.title),
                        body: Some(format!("{} / {}", submission.score, submission.total_points)),
                        course_id: evaluation.course_id,
                        reference_id: Some(submission.id),
                    },
                )
                .await;
        }
        Ok(submission)
    }

    /// Removes the submission with its answers so the student can take the evaluation again.
    pub async fn delete(&self, user: &AuthUser, submission_id: Uuid) -> Result<()> {
        let submission = self.get_by_id(submission_id).await?;
        let evaluation = self.evaluations.get_by_id(submission.evaluation_id).await?;
        access::require_teacher(&self.pool, evaluation.course_id, user).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(r#"DELETE FROM answers WHERE submission_id = $1"#)
            .bind(submission_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM submissions WHERE id = $1"#)
            .bind(submission_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            %submission_id,
            student_id = %submission.student_id,
            user_id = %user.id,
            "submission deleted for retake"
        );
        Ok(())
    }

    /// Stores a file for a `file_upload` question and returns the path to submit as the answer.
    pub async fn upload_answer_file(
        &self,
        user: &AuthUser,
        evaluation_id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<UploadedAnswerFile> {
        let evaluation = self.evaluations.get_by_id(evaluation_id).await?;
        access::require_student(&self.pool, evaluation.course_id, user).await?;
        ensure_open(&evaluation)?;
        if data.is_empty() {
            return Err(Error::BadRequest("File is empty".into()));
        }

        let name = sanitize_file_name(file_name);
        let path = format!("{}{}-{}", upload_prefix(evaluation_id, user.id), Uuid::new_v4(), name);
        self.storage.put(&path, &data).await?;
        Ok(UploadedAnswerFile {
            path,
            name,
            size_bytes: data.len() as i64,
        })
    }

    /// Opens an uploaded answer file; visible to its owner and course teachers.
    pub async fn open_answer_file(
        &self,
        user: &AuthUser,
        evaluation_id: Uuid,
        path: &str,
    ) -> Result<tokio::fs::File> {
        let evaluation = self.evaluations.get_by_id(evaluation_id).await?;
        let role = access::require_member(&self.pool, evaluation.course_id, user).await?;
        let allowed = match role {
            CourseRole::Teacher => path.starts_with(&format!("evaluations/{}/", evaluation_id)),
            CourseRole::Student => path.starts_with(&upload_prefix(evaluation_id, user.id)),
        };
        if !allowed {
            return Err(Error::Forbidden("You cannot access this file".into()));
        }
        self.storage.open(path).await
    }

    async fn get_by_id(&self, submission_id: Uuid) -> Result<Submission> {
        let submission = sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
            .bind(submission_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Submission not found".into()))?;
        Ok(submission)
    }
}

fn ensure_open(evaluation: &Evaluation) -> Result<()> {
    let status = evaluation.status_at(Utc::now());
    if status.accepts_submissions() {
        Ok(())
    } else {
        Err(Error::BadRequest(format!(
            "The evaluation is not open for submissions ({})",
            status.label()
        )))
    }
}

pub fn upload_prefix(evaluation_id: Uuid, student_id: Uuid) -> String {
    format!("evaluations/{}/{}/", evaluation_id, student_id)
}

/// Lines submitted answers up with the questions, in question order.
///
/// Unknown or repeated question ids are rejected; missing answers become `None`.
/// File answers must point into the student's own upload folder.
pub fn prepare_answers(
    questions: &[Question],
    answers: Vec<SubmitAnswer>,
    upload_prefix: &str,
) -> Result<Vec<Option<AnswerValue>>> {
    let mut by_question = HashMap::with_capacity(answers.len());
    for a in answers {
        if by_question.insert(a.question_id, a.answer).is_some() {
            return Err(Error::BadRequest(format!(
                "Question {} was answered more than once",
                a.question_id
            )));
        }
    }

    let mut prepared = Vec::with_capacity(questions.len());
    for q in questions {
        let value = match by_question.remove(&q.id) {
            Some(raw) => AnswerValue::from_json(q.question_type, &raw)?,
            None => None,
        };
        if let Some(AnswerValue::FileUpload(path)) = &value {
            if q.question_type == QuestionType::FileUpload
                && !path.is_empty()
                && !path.starts_with(upload_prefix)
            {
                return Err(Error::BadRequest("File answer does not belong to this submission".into()));
            }
        }
        prepared.push(value);
    }

    if let Some(unknown) = by_question.keys().next() {
        return Err(Error::BadRequest(format!(
            "Question {} does not belong to this evaluation",
            unknown
        )));
    }
    Ok(prepared)
}

/// The student hears about a grade once: when the last pending answer is graded.
fn completes_grading(was_graded: bool, pending: usize) -> bool {
    !was_graded && pending == 0
}

pub fn check_manual_points(points: i32, max_points: i32) -> Result<()> {
    if !(0..=max_points).contains(&points) {
        return Err(Error::BadRequest(format!(
            "Points must be between 0 and {}",
            max_points
        )));
    }
    Ok(())
}

fn review_view(row: ReviewedAnswer, show_key: bool) -> Result<ReviewAnswerView> {
    let correct_answer = match (&row.correct_answer, show_key) {
        (Some(raw), true) => AnswerValue::from_json(row.question_type, raw)?,
        _ => None,
    };
    let answer = match &row.answer {
        Some(raw) => AnswerValue::from_json(row.question_type, raw)?,
        None => None,
    };
    Ok(ReviewAnswerView {
        question_id: row.question_id,
        position: row.position,
        question_type: row.question_type,
        prompt: row.prompt,
        points: row.points,
        options: row.options.0,
        correct_answer,
        answer,
        needs_review: row.is_correct.is_none(),
        is_correct: row.is_correct,
        points_earned: row.points_earned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(question_type: QuestionType) -> Question {
        Question {
            id: Uuid::new_v4(),
            evaluation_id: Uuid::nil(),
            position: 0,
            question_type,
            prompt: "q".into(),
            points: 1,
            options: vec![],
            correct_answer: None,
        }
    }

    fn submit(question_id: Uuid, answer: serde_json::Value) -> SubmitAnswer {
        SubmitAnswer { question_id, answer }
    }

    #[test]
    fn answers_follow_question_order() {
        let qs = vec![question(QuestionType::TrueFalse), question(QuestionType::ShortAnswer)];
        let prepared = prepare_answers(
            &qs,
            vec![submit(qs[1].id, json!("anything")), submit(qs[0].id, json!("true"))],
            "evaluations/e/s/",
        )
        .unwrap();
        assert_eq!(
            prepared,
            vec![
                Some(AnswerValue::TrueFalse(true)),
                Some(AnswerValue::ShortAnswer("anything".into()))
            ]
        );
    }

    #[test]
    fn missing_answers_are_none() {
        let qs = vec![question(QuestionType::MultipleChoice)];
        assert_eq!(prepare_answers(&qs, vec![], "p/").unwrap(), vec![None]);
    }

    #[test]
    fn rejects_foreign_and_duplicate_questions() {
        let qs = vec![question(QuestionType::ShortAnswer)];
        assert!(prepare_answers(&qs, vec![submit(Uuid::new_v4(), json!("x"))], "p/").is_err());
        assert!(prepare_answers(
            &qs,
            vec![submit(qs[0].id, json!("a")), submit(qs[0].id, json!("b"))],
            "p/"
        )
        .is_err());
    }

    #[test]
    fn file_answers_stay_in_own_folder() {
        let qs = vec![question(QuestionType::FileUpload)];
        let prefix = "evaluations/e/s/";
        assert!(prepare_answers(&qs, vec![submit(qs[0].id, json!("evaluations/e/s/1-a.pdf"))], prefix).is_ok());
        assert!(prepare_answers(&qs, vec![submit(qs[0].id, json!("evaluations/e/other/1-a.pdf"))], prefix).is_err());
    }

    #[test]
    fn manual_points_are_bounded_by_question_points() {
        assert!(check_manual_points(0, 5).is_ok());
        assert!(check_manual_points(5, 5).is_ok());
        assert!(check_manual_points(6, 5).is_err());
        assert!(check_manual_points(-1, 5).is_err());
    }

    #[test]
    fn grade_notice_only_on_completion() {
        assert!(completes_grading(false, 0));
        assert!(!completes_grading(false, 2));
        assert!(!completes_grading(true, 0));
    }
}
