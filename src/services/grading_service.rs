use serde::Serialize;
use uuid::Uuid;

use crate::models::question::{AnswerValue, Question, QuestionType};
use crate::models::submission::Answer;

pub struct GradingService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub answer: Option<AnswerValue>,
    /// `None` while the answer waits for a grader.
    pub is_correct: Option<bool>,
    pub points_earned: i32,
    pub max_points: i32,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub earned: i32,
    pub total: i32,
    pub answers: Vec<GradedAnswer>,
}

impl ScoreSummary {
    pub fn pending_review(&self) -> usize {
        self.answers.iter().filter(|a| a.needs_review).count()
    }
}

impl GradingService {
    /// A question is left for a grader when it has no usable answer key or is open-ended.
    pub fn needs_manual_review(question: &Question) -> bool {
        if question.question_type.is_open_ended() {
            return true;
        }
        match &question.correct_answer {
            None => true,
            Some(key) => key.is_empty(),
        }
    }

    /// Compares a student answer with the key. Only meaningful for auto-scorable questions.
    ///
    /// `multiple_select` compares the selections as sets, so order and
    /// duplicates do not matter. Every other type is strict equality.
    pub fn is_correct(
        question_type: QuestionType,
        given: Option<&AnswerValue>,
        correct: &AnswerValue,
    ) -> bool {
        let Some(given) = given else {
            return false;
        };
        if given.question_type() != question_type || correct.question_type() != question_type {
            return false;
        }
        // MultipleSelect holds a BTreeSet, so equality is set equality.
        given == correct
    }

    pub fn grade_answer(question: &Question, given: Option<AnswerValue>) -> GradedAnswer {
        if Self::needs_manual_review(question) {
            return GradedAnswer {
                question_id: question.id,
                answer: given,
                is_correct: None,
                points_earned: 0,
                max_points: question.points,
                needs_review: true,
            };
        }

        let correct = match &question.correct_answer {
            Some(key) => Self::is_correct(question.question_type, given.as_ref(), key),
            None => false,
        };

        GradedAnswer {
            question_id: question.id,
            answer: given,
            is_correct: Some(correct),
            points_earned: if correct { question.points } else { 0 },
            max_points: question.points,
            needs_review: false,
        }
    }

    /// Scores a whole submission in question order.
    ///
    /// `total` counts every question, including the ones waiting for review.
    pub fn score_submission<'a, I>(pairs: I) -> ScoreSummary
    where
        I: IntoIterator<Item = (&'a Question, Option<AnswerValue>)>,
    {
        let mut summary = ScoreSummary::default();
        for (question, given) in pairs {
            summary.total += question.points;
            let graded = Self::grade_answer(question, given);
            summary.earned += graded.points_earned;
            summary.answers.push(graded);
        }
        summary
    }

    /// Score of a submission after manual grading: the sum of every answer's points.
    pub fn recompute_score(answers: &[Answer]) -> i32 {
        answers.iter().map(|a| a.points_earned).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn question(question_type: QuestionType, key: Option<AnswerValue>, points: i32) -> Question {
        Question {
            id: Uuid::new_v4(),
            evaluation_id: Uuid::nil(),
            position: 0,
            question_type,
            prompt: "q".into(),
            points,
            options: vec![],
            correct_answer: key,
        }
    }

    fn select(items: &[&str]) -> AnswerValue {
        AnswerValue::MultipleSelect(items.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>())
    }

    #[test]
    fn missing_answer_is_wrong() {
        let q = question(QuestionType::TrueFalse, Some(AnswerValue::TrueFalse(false)), 2);
        let graded = GradingService::grade_answer(&q, None);
        assert_eq!(graded.is_correct, Some(false));
        assert_eq!(graded.points_earned, 0);
    }

    #[test]
    fn empty_key_needs_review() {
        let q = question(
            QuestionType::MultipleChoice,
            Some(AnswerValue::MultipleChoice(String::new())),
            3,
        );
        assert!(GradingService::needs_manual_review(&q));
        let q = question(QuestionType::MultipleSelect, Some(select(&[])), 3);
        assert!(GradingService::needs_manual_review(&q));
    }

    #[test]
    fn mismatched_variant_is_wrong() {
        assert!(!GradingService::is_correct(
            QuestionType::MultipleChoice,
            Some(&AnswerValue::ShortAnswer("a".into())),
            &AnswerValue::MultipleChoice("a".into()),
        ));
    }

    #[test]
    fn recompute_sums_points() {
        let answers = [4, 0, 3].map(|points| Answer {
            id: Uuid::new_v4(),
            submission_id: Uuid::nil(),
            question_id: Uuid::new_v4(),
            answer: None,
            is_correct: None,
            points_earned: points,
        });
        assert_eq!(GradingService::recompute_score(&answers), 7);
    }
}
