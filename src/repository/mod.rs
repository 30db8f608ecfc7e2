// src/repository/mod.rs

//! Storage port. Handlers talk to `QuizRepository`; `PgRepository` backs it
//! with Postgres and `MemoryRepository` keeps everything in process.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    category::Category,
    challenge::{Challenge, ChallengeUpdate},
    dashboard::DashboardStats,
    leaderboard::LeaderboardEntry,
    question::{NewQuestion, Question, QuestionFilter},
    score::{NewScore, ScoreRecord},
    user::{AdminUserResponse, NewAccount, Role, User, UserProfile},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Failures surfaced by a repository adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The named entity (e.g. "Question") does not exist.
    NotFound(&'static str),
    /// A uniqueness rule was violated.
    Conflict(String),
    /// Anything the storage layer reported that the caller cannot act on.
    Database(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::NotFound(what) => write!(f, "{} not found", what),
            RepositoryError::Conflict(msg) => write!(f, "conflict: {}", msg),
            RepositoryError::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait QuizRepository: Send + Sync {
    // Accounts

    /// Creates the account and its profile together; both or neither.
    async fn create_account(&self, account: NewAccount) -> RepoResult<User>;

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()>;

    async fn profile(&self, user_id: i64) -> RepoResult<Option<UserProfile>>;

    /// Updates the editable profile fields; `None` leaves a field unchanged.
    async fn update_profile(
        &self,
        user_id: i64,
        avatar_url: Option<String>,
        bio: Option<String>,
    ) -> RepoResult<UserProfile>;

    async fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<AdminUserResponse>>;

    async fn admin_user(&self, id: i64) -> RepoResult<Option<AdminUserResponse>>;

    async fn toggle_active(&self, id: i64) -> RepoResult<AdminUserResponse>;

    async fn set_role(&self, id: i64, role: Role) -> RepoResult<AdminUserResponse>;

    // Categories

    async fn list_categories(&self) -> RepoResult<Vec<Category>>;

    async fn category(&self, id: i64) -> RepoResult<Option<Category>>;

    async fn category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;

    async fn create_category(&self, name: &str, slug: &str, description: &str) -> RepoResult<Category>;

    /// Renames/re-describes a category. The slug never changes after creation.
    async fn update_category(&self, id: i64, name: &str, description: &str) -> RepoResult<Category>;

    /// Deletes the category and everything hanging off it.
    async fn delete_category(&self, id: i64) -> RepoResult<()>;

    // Questions

    /// Newest first, optionally scoped to one category.
    async fn list_questions(
        &self,
        category_id: Option<i64>,
        filter: QuestionFilter,
    ) -> RepoResult<Vec<Question>>;

    async fn question(&self, id: i64) -> RepoResult<Option<Question>>;

    async fn create_question(&self, question: NewQuestion) -> RepoResult<Question>;

    async fn update_question(&self, id: i64, question: NewQuestion) -> RepoResult<Question>;

    async fn delete_question(&self, id: i64) -> RepoResult<()>;

    // Score ledger

    /// Appends the score record and adds its points to the user's profile
    /// atomically. Returns the record and the new total.
    async fn record_submission(&self, score: NewScore) -> RepoResult<(ScoreRecord, i64)>;

    /// Removes every score record; profile totals are left as they are.
    async fn purge_scores(&self) -> RepoResult<u64>;

    /// Points per non-admin user: lifetime totals when `since` is `None`,
    /// otherwise the sum of points scored at or after `since`. Unordered.
    async fn standings(&self, since: Option<DateTime<Utc>>) -> RepoResult<Vec<LeaderboardEntry>>;

    // Challenges

    async fn create_challenge(
        &self,
        challenger_id: i64,
        opponent_id: Option<i64>,
        category_id: i64,
    ) -> RepoResult<Challenge>;

    /// Challenges the user sent or received, newest first.
    async fn challenges_for(&self, user_id: i64) -> RepoResult<Vec<Challenge>>;

    async fn challenge(&self, id: i64) -> RepoResult<Option<Challenge>>;

    async fn update_challenge(&self, id: i64, update: ChallengeUpdate) -> RepoResult<Challenge>;

    // Admin dashboard

    async fn dashboard_stats(&self) -> RepoResult<DashboardStats>;
}
