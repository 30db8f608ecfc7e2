// src/domain/access.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    error::AppError,
    models::user::{Role, User},
    utils::jwt::Claims,
};

/// The authenticated caller, resolved from the stored account on every request.
///
/// Handlers check capabilities on this value explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    /// The user id a token was issued for.
    pub fn subject(claims: &Claims) -> Result<i64, AppError> {
        claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin panel and content management.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Playing: submitting answers and taking part in challenges.
    pub fn require_player(&self) -> Result<(), AppError> {
        if self.role == Role::User {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Admin accounts cannot play quizzes or challenges".to_string(),
            ))
        }
    }
}

/// Reads the principal injected by `auth_middleware`.
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or(AppError::AuthError("Authentication required".to_string()))
    }
}
