// src/handlers/profile.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    domain::access::Principal,
    error::AppError,
    extractors::ValidatedJson,
    models::user::{ProfileResponse, UpdateProfileRequest},
    state::Repo,
    utils::html::clean_optional,
};

/// Current user's account and profile.
pub async fn get_profile(
    State(repo): State<Repo>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    let user = repo
        .find_user(principal.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let profile = repo
        .profile(principal.user_id)
        .await?
        .ok_or(AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(ProfileResponse::new(&user, profile)))
}

/// Updates avatar and/or bio. The bio is sanitized before storage.
pub async fn update_profile(
    State(repo): State<Repo>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let avatar_url = match payload.avatar_url {
        Some(raw) => Some(web_url(&raw)?),
        None => None,
    };

    let user = repo
        .find_user(principal.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let profile = repo
        .update_profile(principal.user_id, avatar_url, clean_optional(payload.bio))
        .await?;

    Ok(Json(ProfileResponse::new(&user, profile)))
}

/// Only http(s) links are accepted as avatars.
fn web_url(raw: &str) -> Result<String, AppError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|_| AppError::BadRequest("Enter a valid URL.".to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(AppError::BadRequest(format!(
            "Unsupported avatar URL scheme '{}'",
            other
        ))),
    }
}
