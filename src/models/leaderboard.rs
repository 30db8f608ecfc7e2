// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One player's points for the requested window, before ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub total_points: i64,
    pub badges: Vec<String>,
}

/// Query parameters for `GET /leaderboard/`.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub period: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Echo of the requested period.
    pub period: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}
