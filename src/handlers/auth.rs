// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::{
    config::Config,
    domain::access::Principal,
    error::AppError,
    extractors::ValidatedJson,
    models::user::{LoginRequest, NewAccount, RefreshRequest, RegisterRequest, Role},
    state::Repo,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{TokenType, sign_jwt, verify_jwt},
    },
};

/// Registers a new player account together with its profile.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the public account fields.
pub async fn register(
    State(repo): State<Repo>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hashed_password = hash_password(&payload.password)?;

    let user = repo
        .create_account(NewAccount {
            username: payload.username,
            email: payload.email.unwrap_or_default(),
            password_hash: hashed_password,
            role: Role::User,
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "message": "User registered successfully"
        })),
    ))
}

/// Authenticates a user and returns an access/refresh token pair.
///
/// Unknown users and wrong passwords get the same 401; deactivated accounts get 403.
pub async fn login(
    State(repo): State<Repo>,
    State(config): State<Config>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = repo
        .find_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    repo.record_login(user.id, Utc::now()).await?;

    let access = sign_jwt(
        user.id,
        user.role,
        TokenType::Access,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;
    let refresh = sign_jwt(
        user.id,
        user.role,
        TokenType::Refresh,
        &config.jwt_secret,
        config.refresh_expiration,
    )?;

    Ok(Json(json!({
        "access": access,
        "refresh": refresh,
        "role": user.role,
    })))
}

/// Exchanges a refresh token for a fresh access token.
///
/// The role is re-read from storage so promotions and demotions take effect.
pub async fn refresh(
    State(repo): State<Repo>,
    State(config): State<Config>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_jwt(&payload.refresh, &config.jwt_secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::AuthError("Not a refresh token".to_string()));
    }

    let user_id = Principal::subject(&claims)?;

    let user = repo
        .find_user(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::AuthError("Account no longer available".to_string()))?;

    let access = sign_jwt(
        user.id,
        user.role,
        TokenType::Access,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({ "access": access })))
}
