use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Evaluation {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn status_at(&self, now: DateTime<Utc>) -> EvaluationStatus {
        EvaluationStatus::classify(self.start_date, self.end_date, now)
    }
}

/// Availability of an evaluation, derived from the wall clock on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EvaluationStatus {
    #[serde(rename = "Próximamente")]
    Upcoming,
    #[serde(rename = "Disponible")]
    Available,
    #[serde(rename = "Finalizada")]
    Finished,
}

impl EvaluationStatus {
    /// Both window edges are inclusive.
    pub fn classify(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            EvaluationStatus::Upcoming
        } else if now > end {
            EvaluationStatus::Finished
        } else {
            EvaluationStatus::Available
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Upcoming => "Próximamente",
            EvaluationStatus::Available => "Disponible",
            EvaluationStatus::Finished => "Finalizada",
        }
    }

    pub fn accepts_submissions(self) -> bool {
        self == EvaluationStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn label_matches_serialized_form() {
        for status in [
            EvaluationStatus::Upcoming,
            EvaluationStatus::Available,
            EvaluationStatus::Finished,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str(), Some(status.label()));
        }
    }

    #[test]
    fn end_instant_is_still_available() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let end = start + Duration::hours(2);
        assert_eq!(
            EvaluationStatus::classify(start, end, end),
            EvaluationStatus::Available
        );
    }
}
