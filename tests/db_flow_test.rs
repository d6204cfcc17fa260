mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use aula_virtual::{
    database::pool::{connect, run_migrations},
    dto::{
        course_dto::{CreateCoursePayload, UpdateCoursePayload},
        evaluation_dto::{
            CreateEvaluationPayload, CreateQuestion, GradeAnswerPayload, SubmitAnswer,
            UpdateEvaluationPayload,
        },
    },
    error::Error,
    middleware::auth::AuthUser,
    models::{question::QuestionType, user::UserRole},
    AppState,
};

/// Connects to `DATABASE_URL`; these flows are skipped when it is unset.
async fn setup() -> Option<AppState> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database flow");
        return None;
    };
    let pool = connect(&url).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    let mut config = common::test_config();
    config.database_url = url;
    Some(AppState::new(pool, config).expect("app state"))
}

fn user(role: UserRole) -> AuthUser {
    let id = Uuid::new_v4();
    AuthUser {
        id,
        email: format!("{}@example.com", id),
        name: format!("User {}", &id.to_string()[..8]),
        role,
    }
}

async fn course_with_student(state: &AppState) -> (AuthUser, AuthUser, Uuid) {
    let teacher = user(UserRole::Teacher);
    let student = user(UserRole::Student);
    state.profile_service.ensure(&teacher).await.unwrap();
    state.profile_service.ensure(&student).await.unwrap();

    let course = state
        .course_service
        .create(
            &teacher,
            CreateCoursePayload {
                name: "Matemáticas".into(),
                description: None,
                section: Some("A".into()),
            },
        )
        .await
        .unwrap();
    state.course_service.join(&student, &course.code).await.unwrap();
    (teacher, student, course.id)
}

fn open_evaluation() -> CreateEvaluationPayload {
    let now = Utc::now();
    CreateEvaluationPayload {
        title: "Parcial 1".into(),
        description: None,
        start_date: now - Duration::hours(1),
        end_date: now + Duration::hours(1),
        questions: vec![
            CreateQuestion {
                question_type: QuestionType::TrueFalse,
                prompt: "2 + 2 = 4".into(),
                points: 3,
                options: vec![],
                correct_answer: Some(json!("true")),
            },
            CreateQuestion {
                question_type: QuestionType::ShortAnswer,
                prompt: "Explain why".into(),
                points: 7,
                options: vec![],
                correct_answer: None,
            },
        ],
    }
}

#[tokio::test]
async fn submit_grade_and_retake() {
    let Some(state) = setup().await else { return };
    let (teacher, student, course_id) = course_with_student(&state).await;

    let detail = state
        .evaluation_service
        .create(&teacher, course_id, open_evaluation())
        .await
        .unwrap();
    let evaluation_id = detail.evaluation.id;
    assert_eq!(detail.total_points, 10);

    let questions = state.evaluation_service.load_questions(evaluation_id).await.unwrap();
    let answers = || {
        vec![
            SubmitAnswer { question_id: questions[0].id, answer: json!("true") },
            SubmitAnswer { question_id: questions[1].id, answer: json!("anything") },
        ]
    };

    let submitted = state
        .submission_service
        .submit(&student, evaluation_id, answers())
        .await
        .unwrap();
    assert_eq!(submitted.score, 3);
    assert_eq!(submitted.total_points, 10);
    assert_eq!(submitted.pending_review, 1);

    let stored = state
        .submission_service
        .review(&teacher, submitted.submission_id)
        .await
        .unwrap();
    assert_eq!(stored.answers.len(), 2);
    assert_eq!(stored.answers[0].is_correct, Some(true));
    assert_eq!(stored.answers[0].points_earned, 3);
    assert!(!stored.answers[0].needs_review);
    assert_eq!(stored.answers[1].is_correct, None);
    assert_eq!(stored.answers[1].points_earned, 0);
    assert!(stored.answers[1].needs_review);
    assert!(stored.submission.graded_at.is_none());

    let again = state
        .submission_service
        .submit(&student, evaluation_id, answers())
        .await
        .unwrap_err();
    assert!(matches!(again, Error::Conflict(_)));

    let graded = state
        .submission_service
        .grade_answer(
            &teacher,
            submitted.submission_id,
            GradeAnswerPayload {
                question_id: questions[1].id,
                points_earned: 5,
                is_correct: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(graded.score, 8);
    let first_graded_at = graded.graded_at.expect("fully graded");

    let regraded = state
        .submission_service
        .grade_answer(
            &teacher,
            submitted.submission_id,
            GradeAnswerPayload {
                question_id: questions[1].id,
                points_earned: 6,
                is_correct: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(regraded.score, 9);
    assert_eq!(regraded.graded_at, Some(first_graded_at));

    let grade_notices: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND kind = 'grade'"#,
    )
    .bind(student.id)
    .fetch_one(&state.pool)
    .await
    .unwrap();
    assert_eq!(grade_notices, 1);

    let book = state.gradebook_service.for_course(&student, course_id).await.unwrap();
    assert_eq!(book.rows.len(), 1);
    assert_eq!(book.rows[0].earned, 9);

    state
        .submission_service
        .delete(&teacher, submitted.submission_id)
        .await
        .unwrap();
    let retake = state
        .submission_service
        .submit(&student, evaluation_id, answers())
        .await
        .unwrap();
    assert_ne!(retake.submission_id, submitted.submission_id);

    state.course_service.delete(&teacher, course_id).await.unwrap();
}

#[tokio::test]
async fn students_cannot_grade_or_create() {
    let Some(state) = setup().await else { return };
    let (teacher, student, course_id) = course_with_student(&state).await;

    let err = state
        .evaluation_service
        .create(&student, course_id, open_evaluation())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let detail = state
        .evaluation_service
        .create(&teacher, course_id, open_evaluation())
        .await
        .unwrap();
    let submitted = state
        .submission_service
        .submit(&student, detail.evaluation.id, vec![])
        .await
        .unwrap();
    assert_eq!(submitted.score, 0);

    let questions = state
        .evaluation_service
        .load_questions(detail.evaluation.id)
        .await
        .unwrap();
    let err = state
        .submission_service
        .grade_answer(
            &student,
            submitted.submission_id,
            GradeAnswerPayload {
                question_id: questions[1].id,
                points_earned: 7,
                is_correct: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    state.course_service.delete(&teacher, course_id).await.unwrap();
}

#[tokio::test]
async fn empty_text_clears_optional_fields() {
    let Some(state) = setup().await else { return };
    let (teacher, _student, course_id) = course_with_student(&state).await;

    let mut payload = open_evaluation();
    payload.description = Some("Capítulos 1 a 3".into());
    let detail = state
        .evaluation_service
        .create(&teacher, course_id, payload)
        .await
        .unwrap();
    let evaluation_id = detail.evaluation.id;

    let untouched = state
        .evaluation_service
        .update(
            &teacher,
            evaluation_id,
            UpdateEvaluationPayload {
                title: Some("Parcial 1 (b)".into()),
                description: None,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(untouched.description.as_deref(), Some("Capítulos 1 a 3"));

    let cleared = state
        .evaluation_service
        .update(
            &teacher,
            evaluation_id,
            UpdateEvaluationPayload {
                title: None,
                description: Some(String::new()),
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.description, None);

    let course = state
        .course_service
        .update(
            &teacher,
            course_id,
            UpdateCoursePayload {
                name: None,
                description: None,
                section: Some("  ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(course.section, None);

    state.course_service.delete(&teacher, course_id).await.unwrap();
}
