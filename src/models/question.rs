use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum QuestionType {
    ShortAnswer,
    MultipleChoice,
    MultipleSelect,
    TrueFalse,
    FileUpload,
    Matching,
}

impl QuestionType {
    /// Open-ended questions are never auto-scored.
    pub fn is_open_ended(self) -> bool {
        matches!(
            self,
            QuestionType::ShortAnswer | QuestionType::FileUpload | QuestionType::Matching
        )
    }

    pub fn has_options(self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::MultipleSelect
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::MultipleSelect => "multiple_select",
            QuestionType::TrueFalse => "true_false",
            QuestionType::FileUpload => "file_upload",
            QuestionType::Matching => "matching",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed answer (or answer key), one variant per question type.
///
/// Serializes to the natural JSON shape of the value: strings, arrays of
/// strings, booleans or string maps. Parsing goes through
/// [`AnswerValue::from_json`] because the shape alone does not identify
/// the question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    ShortAnswer(String),
    MultipleChoice(String),
    MultipleSelect(BTreeSet<String>),
    TrueFalse(bool),
    FileUpload(String),
    Matching(BTreeMap<String, String>),
}

impl AnswerValue {
    /// Parses a loosely-typed JSON value into the variant for `question_type`.
    ///
    /// `null` yields `Ok(None)`.
    pub fn from_json(question_type: QuestionType, value: &JsonValue) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }

        let parsed = match question_type {
            QuestionType::ShortAnswer => AnswerValue::ShortAnswer(scalar_string(question_type, value)?),
            QuestionType::MultipleChoice => {
                AnswerValue::MultipleChoice(scalar_string(question_type, value)?)
            }
            QuestionType::FileUpload => AnswerValue::FileUpload(scalar_string(question_type, value)?),
            QuestionType::TrueFalse => AnswerValue::TrueFalse(boolean(value)?),
            QuestionType::MultipleSelect => {
                let items = value.as_array().ok_or_else(|| shape_error(question_type, value))?;
                let set = items
                    .iter()
                    .map(|item| scalar_string(question_type, item))
                    .collect::<Result<BTreeSet<_>>>()?;
                AnswerValue::MultipleSelect(set)
            }
            QuestionType::Matching => {
                let pairs = value.as_object().ok_or_else(|| shape_error(question_type, value))?;
                let map = pairs
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), scalar_string(question_type, v)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?;
                AnswerValue::Matching(map)
            }
        };

        Ok(Some(parsed))
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerValue::ShortAnswer(_) => QuestionType::ShortAnswer,
            AnswerValue::MultipleChoice(_) => QuestionType::MultipleChoice,
            AnswerValue::MultipleSelect(_) => QuestionType::MultipleSelect,
            AnswerValue::TrueFalse(_) => QuestionType::TrueFalse,
            AnswerValue::FileUpload(_) => QuestionType::FileUpload,
            AnswerValue::Matching(_) => QuestionType::Matching,
        }
    }

    /// Empty strings, sets and maps count as "no answer key".
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::ShortAnswer(s)
            | AnswerValue::MultipleChoice(s)
            | AnswerValue::FileUpload(s) => s.is_empty(),
            AnswerValue::MultipleSelect(set) => set.is_empty(),
            AnswerValue::Matching(map) => map.is_empty(),
            AnswerValue::TrueFalse(_) => false,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

fn scalar_string(question_type: QuestionType, value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(shape_error(question_type, other)),
    }
}

fn boolean(value: &JsonValue) -> Result<bool> {
    match value {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        JsonValue::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(shape_error(QuestionType::TrueFalse, other)),
    }
}

fn shape_error(question_type: QuestionType, value: &JsonValue) -> Error {
    Error::BadRequest(format!(
        "Invalid answer for {} question: {}",
        question_type, value
    ))
}

/// Question as stored in the `questions` table.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub position: i32,
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: i32,
    pub options: sqlx::types::Json<Vec<String>>,
    pub correct_answer: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub position: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: i32,
    pub options: Vec<String>,
    pub correct_answer: Option<AnswerValue>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = Error;

    fn try_from(row: QuestionRow) -> Result<Self> {
        let correct_answer = match &row.correct_answer {
            Some(raw) => AnswerValue::from_json(row.question_type, raw)?,
            None => None,
        };
        Ok(Self {
            id: row.id,
            evaluation_id: row.evaluation_id,
            position: row.position,
            question_type: row.question_type,
            prompt: row.prompt,
            points: row.points,
            options: row.options.0,
            correct_answer,
        })
    }
}

/// Question as shown to students: no answer key.
#[derive(Debug, Clone, Serialize)]
pub struct StudentQuestion {
    pub id: Uuid,
    pub position: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: i32,
    pub options: Vec<String>,
}

impl From<&Question> for StudentQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            position: q.position,
            question_type: q.question_type,
            prompt: q.prompt.clone(),
            points: q.points,
            options: q.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn true_false_accepts_strings_and_booleans() {
        let from_str = AnswerValue::from_json(QuestionType::TrueFalse, &json!("true")).unwrap();
        let from_bool = AnswerValue::from_json(QuestionType::TrueFalse, &json!(true)).unwrap();
        assert_eq!(from_str, Some(AnswerValue::TrueFalse(true)));
        assert_eq!(from_str, from_bool);
    }

    #[test]
    fn multiple_select_rejects_scalars() {
        let err = AnswerValue::from_json(QuestionType::MultipleSelect, &json!("a")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn null_is_absent() {
        assert_eq!(
            AnswerValue::from_json(QuestionType::ShortAnswer, &JsonValue::Null).unwrap(),
            None
        );
    }

    #[test]
    fn serializes_to_natural_shape() {
        let value = AnswerValue::from_json(QuestionType::MultipleSelect, &json!(["b", "a", "b"]))
            .unwrap()
            .unwrap();
        assert_eq!(value.to_json(), json!(["a", "b"]));
    }
}
