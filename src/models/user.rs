// src/models/user.rs

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use utoipa::ToSchema;
use validator::Validate;

/// Letters, digits and `@ . + - _`, the classic account-name alphabet.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("static username pattern"));

/// Account role stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// Represents the 'users' table joined with its profile.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub is_active: bool,

    /// Role lives on the profile; joined in for authorization checks.
    pub role: Role,

    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Represents the 'user_profiles' table (one row per account).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub total_points: i64,
    pub badges: Json<Vec<String>>,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to create an account and its profile in one step.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Response for `GET /user/profile/`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub total_points: i64,
    pub badges: Vec<String>,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub created_at: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn new(user: &User, profile: UserProfile) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: profile.role,
            is_admin: profile.role == Role::Admin,
            total_points: profile.total_points,
            badges: profile.badges.0,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
            created_at: profile.created_at,
        }
    }
}

/// DTO for registration. `password2` must repeat `password`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        length(
            min = 3,
            max = 150,
            message = "Username length must be between 3 and 150 characters."
        ),
        regex(
            path = *USERNAME_RE,
            message = "Username may only contain letters, digits and @/./+/-/_ characters."
        )
    )]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(
        length(
            min = 6,
            max = 128,
            message = "Password length must be between 6 and 128 characters."
        ),
        must_match(other = "password2", message = "Password fields didn't match.")
    )]
    pub password: String,

    pub password2: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh: String,
}

/// DTO for `PATCH /user/profile/`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 500), url(message = "Enter a valid URL."))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

/// Admin view of an account.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AdminUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub role: Role,
    pub total_points: i64,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Query parameters for listing users in the admin panel.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleRequest {
    #[validate(length(min = 1, max = 20))]
    pub role: String,
}
