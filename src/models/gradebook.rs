use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GradebookColumn {
    pub evaluation_id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub total_points: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct GradebookStudent {
    pub student_id: Uuid,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct GradebookScore {
    pub evaluation_id: Uuid,
    pub student_id: Uuid,
    pub score: i32,
    pub total_points: i32,
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GradebookCell {
    pub evaluation_id: Uuid,
    pub score: i32,
    pub total_points: i32,
    pub pending_review: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GradebookRow {
    pub student_id: Uuid,
    pub full_name: String,
    pub email: String,
    /// One entry per column; `None` when the student has not submitted.
    pub cells: Vec<Option<GradebookCell>>,
    pub earned: i64,
    pub possible: i64,
    #[schema(value_type = String)]
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Gradebook {
    pub course_id: Uuid,
    pub columns: Vec<GradebookColumn>,
    pub rows: Vec<GradebookRow>,
}

impl Gradebook {
    /// Builds the students × evaluations matrix.
    ///
    /// Totals only count evaluations the student submitted.
    pub fn build(
        course_id: Uuid,
        columns: Vec<GradebookColumn>,
        students: Vec<GradebookStudent>,
        scores: Vec<GradebookScore>,
    ) -> Self {
        let by_pair: HashMap<(Uuid, Uuid), GradebookScore> = scores
            .into_iter()
            .map(|s| ((s.student_id, s.evaluation_id), s))
            .collect();

        let rows = students
            .into_iter()
            .map(|student| {
                let cells: Vec<Option<GradebookCell>> = columns
                    .iter()
                    .map(|col| {
                        by_pair
                            .get(&(student.student_id, col.evaluation_id))
                            .map(|s| GradebookCell {
                                evaluation_id: s.evaluation_id,
                                score: s.score,
                                total_points: s.total_points,
                                pending_review: s.graded_at.is_none(),
                            })
                    })
                    .collect();
                let earned = cells.iter().flatten().map(|c| i64::from(c.score)).sum();
                let possible = cells.iter().flatten().map(|c| i64::from(c.total_points)).sum();
                GradebookRow {
                    student_id: student.student_id,
                    full_name: student.full_name,
                    email: student.email,
                    cells,
                    earned,
                    possible,
                    percentage: percentage(earned, possible),
                }
            })
            .collect();

        Self {
            course_id,
            columns,
            rows,
        }
    }

    pub fn retain_student(&mut self, student_id: Uuid) {
        self.rows.retain(|r| r.student_id == student_id);
    }
}

/// `earned / possible` as a percentage with two decimals; zero when nothing is possible.
pub fn percentage(earned: i64, possible: i64) -> Decimal {
    if possible <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(earned) * Decimal::ONE_HUNDRED / Decimal::from(possible)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn column(title: &str, total: i64) -> GradebookColumn {
        GradebookColumn {
            evaluation_id: Uuid::new_v4(),
            title: title.into(),
            start_date: Utc::now(),
            total_points: total,
        }
    }

    fn student(name: &str) -> GradebookStudent {
        GradebookStudent {
            student_id: Uuid::new_v4(),
            full_name: name.into(),
            email: format!("{}@aula.test", name),
        }
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(2, 3), Decimal::from_str("66.67").unwrap());
        assert_eq!(percentage(0, 0), Decimal::ZERO);
        assert_eq!(percentage(5, 5), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn missing_submissions_leave_empty_cells() {
        let cols = vec![column("Quiz 1", 4), column("Quiz 2", 6)];
        let ana = student("ana");
        let luis = student("luis");
        let scores = vec![GradebookScore {
            evaluation_id: cols[1].evaluation_id,
            student_id: ana.student_id,
            score: 3,
            total_points: 6,
            graded_at: None,
        }];
        let ana_id = ana.student_id;

        let mut book = Gradebook::build(Uuid::nil(), cols, vec![ana, luis], scores);
        assert_eq!(book.rows.len(), 2);
        let row = &book.rows[0];
        assert!(row.cells[0].is_none());
        assert_eq!(row.cells[1].as_ref().map(|c| c.pending_review), Some(true));
        assert_eq!((row.earned, row.possible), (3, 6));
        assert_eq!(row.percentage, Decimal::from(50));
        assert_eq!(book.rows[1].percentage, Decimal::ZERO);

        book.retain_student(ana_id);
        assert_eq!(book.rows.len(), 1);
    }
}
