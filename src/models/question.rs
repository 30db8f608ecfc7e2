// src/models/question.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// How a question is answered and graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "question_type", rename_all = "UPPERCASE")]
pub enum QuestionType {
    /// Multiple choice: the answer is an option index.
    #[default]
    Mcq,
    /// Quick fire: a short string compared case-insensitively.
    Quick,
    /// Coding challenge: submitted source code.
    Coding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "question_difficulty", rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "question_language", rename_all = "UPPERCASE")]
pub enum Language {
    Python,
    Javascript,
    Java,
    Cpp,
    Go,
    #[default]
    General,
}

impl FromStr for QuestionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MCQ" => Ok(QuestionType::Mcq),
            "QUICK" => Ok(QuestionType::Quick),
            "CODING" => Ok(QuestionType::Coding),
            _ => Err(()),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

/// Represents the 'questions' table joined with its category name.
///
/// Carries the answer keys; only the admin API serializes it directly.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,

    pub title: String,

    #[serde(rename = "category")]
    pub category_id: i64,

    pub category_name: String,

    pub question_type: QuestionType,

    pub difficulty: Difficulty,

    pub language: Language,

    /// The prompt shown to the player.
    pub question_text: String,

    /// MCQ options, stored as a JSON array.
    #[schema(value_type = Option<Vec<String>>)]
    pub options: Option<Json<Vec<String>>>,

    /// Index into `options` for MCQ.
    pub correct_option: Option<i32>,

    /// Expected answer for QUICK.
    pub correct_answer: Option<String>,

    /// Reference solution for CODING.
    pub solution_code: Option<String>,

    pub explanation: String,

    pub points: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for sending a question to players (no answer keys, no explanation).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: i64,
    pub title: String,
    pub category: i64,
    pub category_name: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub language: Language,
    pub question_text: String,
    pub options: Option<Vec<String>>,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            title: q.title,
            category: q.category_id,
            category_name: q.category_name,
            question_type: q.question_type,
            difficulty: q.difficulty,
            language: q.language,
            question_text: q.question_text,
            options: q.options.map(|o| o.0),
            points: q.points,
            created_at: q.created_at,
        }
    }
}

/// DTO for creating or replacing a question (admin).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_answer_key"))]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub category: i64,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub language: Language,
    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,
    #[validate(custom(function = "validate_options"))]
    pub options: Option<Vec<String>>,
    pub correct_option: Option<i32>,
    #[validate(length(max = 500))]
    pub correct_answer: Option<String>,
    #[validate(length(max = 20000))]
    pub solution_code: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub explanation: String,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, max = 1000))]
    pub points: i32,
}

fn default_points() -> i32 {
    10
}

/// A question row ready to be written; produced from a validated request.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub category_id: i64,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub language: Language,
    pub question_text: String,
    pub options: Option<Vec<String>>,
    pub correct_option: Option<i32>,
    pub correct_answer: Option<String>,
    pub solution_code: Option<String>,
    pub explanation: String,
    pub points: i32,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() < 2 {
        return Err(ValidationError::new("options_need_at_least_two"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// The key matching `question_type` must be present and usable.
fn validate_answer_key(req: &QuestionRequest) -> Result<(), ValidationError> {
    match req.question_type {
        QuestionType::Mcq => {
            let count = req.options.as_ref().map_or(0, |o| o.len());
            match req.correct_option {
                Some(idx) if idx >= 0 && (idx as usize) < count => Ok(()),
                _ => Err(ValidationError::new("mcq_requires_valid_correct_option")),
            }
        }
        QuestionType::Quick => match req.correct_answer.as_deref() {
            Some(ans) if !ans.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::new("quick_requires_correct_answer")),
        },
        QuestionType::Coding => match req.solution_code.as_deref() {
            Some(code) if !code.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::new("coding_requires_solution_code")),
        },
    }
}

/// Query parameters for listing a category's questions.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub difficulty: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    /// Kept as text so a non-numeric limit is ignored rather than rejected.
    pub limit: Option<String>,
}

/// Parsed filters; `None` means "no constraint".
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionFilter {
    pub difficulty: Option<Difficulty>,
    pub question_type: Option<QuestionType>,
    pub limit: Option<usize>,
}

impl QuestionListParams {
    /// Parses the raw parameters. Returns `None` when a filter names a value
    /// no question can have, so the caller can answer with an empty list.
    pub fn filter(&self) -> Option<QuestionFilter> {
        let difficulty = match non_empty(&self.difficulty) {
            Some(raw) => Some(raw.parse::<Difficulty>().ok()?),
            None => None,
        };
        let question_type = match non_empty(&self.question_type) {
            Some(raw) => Some(raw.parse::<QuestionType>().ok()?),
            None => None,
        };
        let limit = non_empty(&self.limit).and_then(|raw| raw.trim().parse::<usize>().ok());

        Some(QuestionFilter {
            difficulty,
            question_type,
            limit,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
