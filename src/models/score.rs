// src/models/score.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Longest raw answer kept on a score record, in characters.
pub const SUBMITTED_ANSWER_MAX_CHARS: usize = 500;

/// Represents the 'scores' table: one row per graded attempt. Never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ScoreRecord {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub points_awarded: i32,
    /// Seconds the player reported spending on the question.
    pub time_taken: i32,
    pub is_correct: bool,
    pub submitted_answer: String,
    pub created_at: DateTime<Utc>,
}

/// A graded attempt on its way into the ledger.
#[derive(Debug, Clone)]
pub struct NewScore {
    pub user_id: i64,
    pub question_id: i64,
    pub points_awarded: i32,
    pub time_taken: i32,
    pub is_correct: bool,
    pub submitted_answer: String,
}

impl NewScore {
    /// Picks the answer text to keep (`answer`, else `code`) and truncates it.
    pub fn raw_answer(submission: &SubmissionRequest) -> String {
        let raw = match submission.answer.as_deref() {
            Some(answer) if !answer.is_empty() => answer,
            _ => submission.code.as_deref().unwrap_or_default(),
        };
        raw.chars().take(SUBMITTED_ANSWER_MAX_CHARS).collect()
    }
}

/// DTO for `POST /questions/{id}/submit/`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SubmissionRequest {
    /// MCQ option index or QUICK answer. Numbers and booleans are accepted as text.
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub answer: Option<String>,
    /// Source code for CODING questions.
    pub code: Option<String>,
    pub language: Option<String>,
    #[validate(range(min = 0, message = "time_taken must not be negative"))]
    pub time_taken: Option<i32>,
}

/// Accepts any JSON scalar and keeps its textual form; objects and arrays are rejected.
fn scalar_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected a string or number, got {}", other))),
    }
}

/// Result returned to the player after grading.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub correct: bool,
    pub points_awarded: i32,
    pub time_taken: i32,
    pub total_points: i64,
    /// Only revealed for correct answers.
    pub explanation: Option<String>,
}
