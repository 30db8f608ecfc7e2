// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config, domain::access::Principal, error::AppError, models::user::Role, state::Repo,
};

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role at the time the token was issued.
    pub role: Role,
    pub token_type: TokenType,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new JWT for the user.
///
/// Arguments:
/// * `id`: User ID.
/// * `role`: User role.
/// * `token_type`: access or refresh.
pub fn sign_jwt(
    id: i64,
    role: Role,
    token_type: TokenType,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs();
    let expiration = usize::try_from(now.saturating_add(expiration_seconds))
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let claims = Claims {
        sub: id.to_string(), // Store User ID in 'sub' claim
        role,
        token_type,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header,
/// then reloads the account so the current role and active flag apply rather
/// than whatever the token carried. Injects the resolved `Principal` into the
/// request extensions. Refresh tokens, unknown and deactivated accounts get
/// 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    State(repo): State<Repo>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::AuthError("Authentication required".to_string()))?;

    let claims = verify_jwt(token, &config.jwt_secret)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::AuthError("Invalid token".to_string()));
    }

    let user_id = Principal::subject(&claims)?;
    let user = repo
        .find_user(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::AuthError("Account no longer available".to_string()))?;

    req.extensions_mut().insert(Principal::from_user(&user));
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Requires the admin capability.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    req.extensions()
        .get::<Principal>()
        .ok_or(AppError::AuthError("Authentication required".to_string()))?
        .require_admin()?;

    Ok(next.run(req).await)
}
