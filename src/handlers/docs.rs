// src/handlers/docs.rs

//! OpenAPI document describing the request and response bodies.

use axum::{Json, response::IntoResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    category::{Category, CategoryRequest},
    challenge::{Challenge, ChallengeStatus, ChallengeTransitionRequest, CreateChallengeRequest},
    dashboard::{DashboardOverview, DashboardStats, RecentUser, TopPerformer},
    leaderboard::{LeaderboardEntry, LeaderboardResponse},
    question::{Difficulty, Language, PublicQuestion, Question, QuestionRequest, QuestionType},
    score::{ScoreRecord, SubmissionRequest, SubmissionResponse},
    user::{
        AdminUserResponse, ChangeRoleRequest, LoginRequest, ProfileResponse, RefreshRequest,
        RegisterRequest, Role, UpdateProfileRequest,
    },
};

/// Registers the `bearer_auth` scheme used by every protected route.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quiz Arena API",
        description = "Categories, questions, graded submissions, leaderboards and challenges."
    ),
    components(schemas(
        Role,
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        ProfileResponse,
        UpdateProfileRequest,
        AdminUserResponse,
        ChangeRoleRequest,
        Category,
        CategoryRequest,
        QuestionType,
        Difficulty,
        Language,
        Question,
        PublicQuestion,
        QuestionRequest,
        SubmissionRequest,
        SubmissionResponse,
        ScoreRecord,
        LeaderboardEntry,
        LeaderboardResponse,
        ChallengeStatus,
        Challenge,
        CreateChallengeRequest,
        ChallengeTransitionRequest,
        DashboardOverview,
        TopPerformer,
        RecentUser,
        DashboardStats,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
