use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use aula_virtual::{
    models::{
        evaluation::EvaluationStatus,
        question::{AnswerValue, Question, QuestionType},
    },
    services::grading_service::GradingService,
};

fn question(question_type: QuestionType, key: Option<AnswerValue>, points: i32) -> Question {
    Question {
        id: Uuid::new_v4(),
        evaluation_id: Uuid::nil(),
        position: 0,
        question_type,
        prompt: "prompt".into(),
        points,
        options: vec!["a".into(), "b".into(), "c".into()],
        correct_answer: key,
    }
}

fn parse(question_type: QuestionType, value: serde_json::Value) -> Option<AnswerValue> {
    AnswerValue::from_json(question_type, &value).expect("answer parses")
}

#[test]
fn manual_review_questions_contribute_nothing() {
    for question_type in [
        QuestionType::ShortAnswer,
        QuestionType::FileUpload,
        QuestionType::Matching,
    ] {
        let q = question(question_type, None, 5);
        let given = match question_type {
            QuestionType::Matching => parse(question_type, json!({ "a": "1" })),
            _ => parse(question_type, json!("whatever")),
        };
        let graded = GradingService::grade_answer(&q, given);
        assert!(graded.needs_review, "{question_type} should wait for a grader");
        assert_eq!(graded.points_earned, 0);
        assert_eq!(graded.is_correct, None);
    }
}

#[test]
fn multiple_select_ignores_order() {
    let key: BTreeSet<String> = ["a", "c"].iter().map(|s| s.to_string()).collect();
    let q = question(
        QuestionType::MultipleSelect,
        Some(AnswerValue::MultipleSelect(key)),
        4,
    );

    let reversed = parse(QuestionType::MultipleSelect, json!(["c", "a"]));
    assert_eq!(GradingService::grade_answer(&q, reversed).points_earned, 4);

    let subset = parse(QuestionType::MultipleSelect, json!(["a"]));
    assert_eq!(GradingService::grade_answer(&q, subset).is_correct, Some(false));

    let superset = parse(QuestionType::MultipleSelect, json!(["a", "b", "c"]));
    assert_eq!(GradingService::grade_answer(&q, superset).points_earned, 0);
}

#[test]
fn earned_never_exceeds_total() {
    let questions = vec![
        question(QuestionType::TrueFalse, Some(AnswerValue::TrueFalse(true)), 2),
        question(
            QuestionType::MultipleChoice,
            Some(AnswerValue::MultipleChoice("b".into())),
            3,
        ),
        question(QuestionType::ShortAnswer, None, 5),
    ];
    let answers = vec![
        parse(QuestionType::TrueFalse, json!(true)),
        parse(QuestionType::MultipleChoice, json!("b")),
        parse(QuestionType::ShortAnswer, json!("essay")),
    ];

    let summary = GradingService::score_submission(questions.iter().zip(answers));
    assert_eq!(summary.total, 10);
    assert_eq!(summary.earned, 5);
    assert!(summary.earned <= summary.total);
    assert_eq!(summary.pending_review(), 1);
}

#[test]
fn true_false_and_short_answer_scenario() {
    let tf = question(QuestionType::TrueFalse, parse(QuestionType::TrueFalse, json!("true")), 3);
    let short = question(QuestionType::ShortAnswer, None, 7);
    let questions = [tf, short];
    let answers = vec![
        parse(QuestionType::TrueFalse, json!("true")),
        parse(QuestionType::ShortAnswer, json!("anything")),
    ];

    let summary = GradingService::score_submission(questions.iter().zip(answers));
    assert_eq!(summary.earned, 3);
    assert_eq!(summary.total, 10);
    assert_eq!(summary.answers[0].is_correct, Some(true));
    assert_eq!(summary.answers[1].is_correct, None);
    assert_eq!(
        summary.answers[1].answer,
        Some(AnswerValue::ShortAnswer("anything".into()))
    );
}

#[test]
fn unanswered_questions_score_zero() {
    let q = question(
        QuestionType::MultipleChoice,
        Some(AnswerValue::MultipleChoice("a".into())),
        2,
    );
    let summary = GradingService::score_submission([(&q, None)]);
    assert_eq!(summary.earned, 0);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.answers[0].is_correct, Some(false));
}

#[test]
fn status_follows_the_window_edges() {
    let start = Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap();
    let end = start + Duration::hours(1);
    let one = Duration::seconds(1);

    assert_eq!(
        EvaluationStatus::classify(start, end, start - one),
        EvaluationStatus::Upcoming
    );
    assert_eq!(
        EvaluationStatus::classify(start, end, start),
        EvaluationStatus::Available
    );
    assert_eq!(
        EvaluationStatus::classify(start, end, end + one),
        EvaluationStatus::Finished
    );
    assert!(!EvaluationStatus::Upcoming.accepts_submissions());
    assert!(EvaluationStatus::Available.accepts_submissions());
    assert!(!EvaluationStatus::Finished.accepts_submissions());
}
