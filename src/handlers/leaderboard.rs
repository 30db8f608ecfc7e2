// src/handlers/leaderboard.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    domain::leaderboard::{LEADERBOARD_SIZE, Period, rank},
    error::AppError,
    models::leaderboard::{LeaderboardParams, LeaderboardResponse},
    state::Repo,
};

/// Top players for `period` (overall, daily or weekly). Admins are never listed.
pub async fn get_leaderboard(
    State(repo): State<Repo>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let period = Period::parse(params.period.as_deref());
    let standings = repo.standings(period.window_start(Utc::now())).await?;

    Ok(Json(LeaderboardResponse {
        period: params.period.unwrap_or_else(|| "overall".to_string()),
        leaderboard: rank(standings, LEADERBOARD_SIZE),
    }))
}
