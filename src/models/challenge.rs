// src/models/challenge.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Lifecycle of a challenge between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "challenge_status", rename_all = "UPPERCASE")]
pub enum ChallengeStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// Represents the 'challenges' table, joined with participant and category names.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Challenge {
    pub id: i64,
    #[serde(rename = "challenger")]
    pub challenger_id: i64,
    pub challenger_name: String,
    #[serde(rename = "opponent")]
    pub opponent_id: Option<i64>,
    pub opponent_name: Option<String>,
    #[serde(rename = "category")]
    pub category_id: i64,
    pub category_name: String,
    pub status: ChallengeStatus,
    #[serde(rename = "winner")]
    pub winner_id: Option<i64>,
    pub winner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    pub fn involves(&self, user_id: i64) -> bool {
        self.challenger_id == user_id || self.opponent_id == Some(user_id)
    }
}

/// DTO for opening a challenge. The challenger is always the caller.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateChallengeRequest {
    pub category: i64,
    pub opponent: Option<i64>,
}

/// DTO for moving a challenge to another state (admin).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChallengeTransitionRequest {
    pub status: ChallengeStatus,
    pub winner: Option<i64>,
}

/// The columns a transition rewrites.
///
/// Applied only while the stored status still equals `from`.
#[derive(Debug, Clone)]
pub struct ChallengeUpdate {
    pub from: ChallengeStatus,
    pub status: ChallengeStatus,
    pub winner_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
