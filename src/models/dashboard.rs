// src/models/dashboard.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub total_users: i64,
    pub admin_users: i64,
    pub total_questions: i64,
    pub total_categories: i64,
    pub total_quiz_attempts: i64,
    pub correct_attempts: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TopPerformer {
    pub username: String,
    pub points: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RecentUser {
    pub username: String,
    pub date_joined: DateTime<Utc>,
}

/// Payload of `GET /admin/dashboard/stats/`.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardStats {
    pub overview: DashboardOverview,
    pub top_performers: Vec<TopPerformer>,
    pub recent_users: Vec<RecentUser>,
    /// Question counts keyed by `MCQ` / `QUICK` / `CODING`.
    pub questions_by_type: BTreeMap<String, i64>,
    /// Question counts keyed by `EASY` / `MEDIUM` / `HARD`.
    pub questions_by_difficulty: BTreeMap<String, i64>,
}
