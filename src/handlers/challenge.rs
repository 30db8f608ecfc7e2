// src/handlers/challenge.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    domain::access::Principal,
    error::AppError,
    extractors::ValidatedJson,
    models::{
        challenge::{Challenge, CreateChallengeRequest},
        user::Role,
    },
    state::Repo,
};

/// Challenges the caller sent or received, newest first.
pub async fn list_challenges(
    State(repo): State<Repo>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    principal.require_player()?;

    Ok(Json(repo.challenges_for(principal.user_id).await?))
}

/// Opens a PENDING challenge with the caller as challenger.
///
/// The opponent, when named, must be another active player.
pub async fn create_challenge(
    State(repo): State<Repo>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<CreateChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_player()?;

    repo.category(payload.category)
        .await?
        .ok_or(AppError::BadRequest(format!(
            "Category {} does not exist",
            payload.category
        )))?;

    if let Some(opponent_id) = payload.opponent {
        if opponent_id == principal.user_id {
            return Err(AppError::BadRequest(
                "You cannot challenge yourself".to_string(),
            ));
        }
        let opponent = repo
            .find_user(opponent_id)
            .await?
            .ok_or(AppError::BadRequest(format!(
                "User {} does not exist",
                opponent_id
            )))?;
        if opponent.role == Role::Admin {
            return Err(AppError::BadRequest(
                "Admin accounts cannot be challenged".to_string(),
            ));
        }
        if !opponent.is_active {
            return Err(AppError::BadRequest(format!(
                "User {} is not active",
                opponent_id
            )));
        }
    }

    let challenge = repo
        .create_challenge(principal.user_id, payload.opponent, payload.category)
        .await?;

    tracing::info!(
        "User {} opened challenge {} in category {}",
        principal.user_id,
        challenge.id,
        challenge.category_id
    );

    Ok((StatusCode::CREATED, Json(challenge)))
}

pub async fn get_challenge(
    State(repo): State<Repo>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let challenge = own_challenge(&repo, principal, id).await?;
    Ok(Json(challenge))
}

/// Status endpoint for polling clients; same body as `get_challenge`.
pub async fn challenge_status(
    State(repo): State<Repo>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let challenge = own_challenge(&repo, principal, id).await?;
    Ok(Json(challenge))
}

/// Loads a challenge the caller takes part in. Others' challenges are reported as missing.
async fn own_challenge(repo: &Repo, principal: Principal, id: i64) -> Result<Challenge, AppError> {
    principal.require_player()?;

    repo.challenge(id)
        .await?
        .filter(|c| c.involves(principal.user_id))
        .ok_or(AppError::NotFound("Challenge not found".to_string()))
}
