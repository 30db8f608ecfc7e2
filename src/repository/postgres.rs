// src/repository/postgres.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, types::Json};

use super::{QuizRepository, RepoResult, RepositoryError};
use crate::models::{
    category::Category,
    challenge::{Challenge, ChallengeStatus, ChallengeUpdate},
    dashboard::{DashboardOverview, DashboardStats, RecentUser, TopPerformer},
    leaderboard::LeaderboardEntry,
    question::{NewQuestion, Question, QuestionFilter},
    score::{NewScore, ScoreRecord},
    user::{AdminUserResponse, NewAccount, Role, User, UserProfile},
};

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.password, u.is_active, p.role, u.date_joined, u.last_login
    FROM users u
    JOIN user_profiles p ON p.user_id = u.id
"#;

const PROFILE_COLUMNS: &str =
    "user_id, total_points, badges, avatar_url, bio, role, created_at, updated_at";

const ADMIN_USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.is_active, p.role, p.total_points, u.date_joined, u.last_login
    FROM users u
    JOIN user_profiles p ON p.user_id = u.id
"#;

const CATEGORY_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.slug, c.description, c.created_at,
        (SELECT COUNT(*) FROM questions q WHERE q.category_id = c.id) AS question_count
    FROM categories c
"#;

const QUESTION_SELECT: &str = r#"
    SELECT
        q.id, q.title, q.category_id, c.name AS category_name,
        q.question_type, q.difficulty, q.language, q.question_text,
        q.options, q.correct_option, q.correct_answer, q.solution_code,
        q.explanation, q.points, q.created_at, q.updated_at
    FROM questions q
    JOIN categories c ON c.id = q.category_id
"#;

const CHALLENGE_SELECT: &str = r#"
    SELECT
        ch.id,
        ch.challenger_id, cu.username AS challenger_name,
        ch.opponent_id, ou.username AS opponent_name,
        ch.category_id, c.name AS category_name,
        ch.status,
        ch.winner_id, wu.username AS winner_name,
        ch.created_at, ch.started_at, ch.completed_at
    FROM challenges ch
    JOIN users cu ON cu.id = ch.challenger_id
    LEFT JOIN users ou ON ou.id = ch.opponent_id
    JOIN categories c ON c.id = ch.category_id
    LEFT JOIN users wu ON wu.id = ch.winner_id
"#;

/// Helper row for leaderboard queries; badges arrive as JSONB.
#[derive(FromRow)]
struct StandingRow {
    id: i64,
    username: String,
    avatar_url: Option<String>,
    total_points: i64,
    badges: Json<Vec<String>>,
}

impl From<StandingRow> for LeaderboardEntry {
    fn from(row: StandingRow) -> Self {
        LeaderboardEntry {
            id: row.id,
            username: row.username,
            avatar_url: row.avatar_url,
            total_points: row.total_points,
            badges: row.badges.0,
        }
    }
}

/// Maps constraint violations on writes to domain errors.
fn write_error(err: sqlx::Error, conflict: impl FnOnce() -> String, missing: &'static str) -> RepositoryError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return RepositoryError::Conflict(conflict());
        }
        if db.is_foreign_key_violation() {
            return RepositoryError::NotFound(missing);
        }
    }
    tracing::error!("Database write failed: {:?}", err);
    RepositoryError::from(err)
}

/// Postgres-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn required_admin_user(&self, id: i64) -> RepoResult<AdminUserResponse> {
        self.admin_user(id)
            .await?
            .ok_or(RepositoryError::NotFound("User"))
    }

    async fn required_question(&self, id: i64) -> RepoResult<Question> {
        self.question(id)
            .await?
            .ok_or(RepositoryError::NotFound("Question"))
    }

    async fn required_category(&self, id: i64) -> RepoResult<Category> {
        self.category(id)
            .await?
            .ok_or(RepositoryError::NotFound("Category"))
    }

    async fn required_challenge(&self, id: i64) -> RepoResult<Challenge> {
        self.challenge(id)
            .await?
            .ok_or(RepositoryError::NotFound("Challenge"))
    }

    async fn count(&self, sql: &str) -> RepoResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await?)
    }

    async fn grouped_counts(&self, sql: &str) -> RepoResult<BTreeMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl QuizRepository for PgRepository {
    async fn create_account(&self, account: NewAccount) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            write_error(
                e,
                || format!("Username '{}' already exists", account.username),
                "User",
            )
        })?;

        sqlx::query("INSERT INTO user_profiles (user_id, role) VALUES ($1, $2)")
            .bind(id)
            .bind(account.role)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.find_user(id).await?.ok_or(RepositoryError::NotFound("User"))
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE u.id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE u.username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn profile(&self, user_id: i64) -> RepoResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
        Ok(sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        avatar_url: Option<String>,
        bio: Option<String>,
    ) -> RepoResult<UserProfile> {
        let sql = format!(
            r#"
            UPDATE user_profiles
            SET avatar_url = COALESCE($1, avatar_url),
                bio = COALESCE($2, bio),
                updated_at = NOW()
            WHERE user_id = $3
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(avatar_url)
            .bind(bio)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound("Profile"))
    }

    async fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<AdminUserResponse>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(ADMIN_USER_SELECT);
        if let Some(role) = role {
            builder.push(" WHERE p.role = ");
            builder.push_bind(role);
        }
        builder.push(" ORDER BY u.id DESC");

        Ok(builder
            .build_query_as::<AdminUserResponse>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn admin_user(&self, id: i64) -> RepoResult<Option<AdminUserResponse>> {
        let sql = format!("{ADMIN_USER_SELECT} WHERE u.id = $1");
        Ok(sqlx::query_as::<_, AdminUserResponse>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn toggle_active(&self, id: i64) -> RepoResult<AdminUserResponse> {
        let result = sqlx::query("UPDATE users SET is_active = NOT is_active WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("User"));
        }
        self.required_admin_user(id).await
    }

    async fn set_role(&self, id: i64, role: Role) -> RepoResult<AdminUserResponse> {
        let result =
            sqlx::query("UPDATE user_profiles SET role = $1, updated_at = NOW() WHERE user_id = $2")
                .bind(role)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("User"));
        }
        self.required_admin_user(id).await
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let sql = format!("{CATEGORY_SELECT} ORDER BY c.name");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn category(&self, id: i64) -> RepoResult<Option<Category>> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.id = $1");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.slug = $1");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_category(&self, name: &str, slug: &str, description: &str) -> RepoResult<Category> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("Category '{}' already exists", name), "Category"))?;

        self.required_category(id).await
    }

    async fn update_category(&self, id: i64, name: &str, description: &str) -> RepoResult<Category> {
        let result = sqlx::query("UPDATE categories SET name = $1, description = $2 WHERE id = $3")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || format!("Category '{}' already exists", name), "Category"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Category"));
        }
        self.required_category(id).await
    }

    async fn delete_category(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Category"));
        }
        Ok(())
    }

    async fn list_questions(
        &self,
        category_id: Option<i64>,
        filter: QuestionFilter,
    ) -> RepoResult<Vec<Question>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(QUESTION_SELECT);
        builder.push(" WHERE TRUE");

        if let Some(category_id) = category_id {
            builder.push(" AND q.category_id = ");
            builder.push_bind(category_id);
        }
        if let Some(difficulty) = filter.difficulty {
            builder.push(" AND q.difficulty = ");
            builder.push_bind(difficulty);
        }
        if let Some(question_type) = filter.question_type {
            builder.push(" AND q.question_type = ");
            builder.push_bind(question_type);
        }

        builder.push(" ORDER BY q.created_at DESC, q.id DESC");

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        Ok(builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn question(&self, id: i64) -> RepoResult<Option<Question>> {
        let sql = format!("{QUESTION_SELECT} WHERE q.id = $1");
        Ok(sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_question(&self, question: NewQuestion) -> RepoResult<Question> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO questions
            (title, category_id, question_type, difficulty, language, question_text,
             options, correct_option, correct_answer, solution_code, explanation, points)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&question.title)
        .bind(question.category_id)
        .bind(question.question_type)
        .bind(question.difficulty)
        .bind(question.language)
        .bind(&question.question_text)
        .bind(question.options.clone().map(Json))
        .bind(question.correct_option)
        .bind(&question.correct_answer)
        .bind(&question.solution_code)
        .bind(&question.explanation)
        .bind(question.points)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, || "Duplicate question".to_string(), "Category"))?;

        self.required_question(id).await
    }

    async fn update_question(&self, id: i64, question: NewQuestion) -> RepoResult<Question> {
        let result = sqlx::query(
            r#"
            UPDATE questions SET
                title = $1, category_id = $2, question_type = $3, difficulty = $4,
                language = $5, question_text = $6, options = $7, correct_option = $8,
                correct_answer = $9, solution_code = $10, explanation = $11, points = $12,
                updated_at = NOW()
            WHERE id = $13
            "#,
        )
        .bind(&question.title)
        .bind(question.category_id)
        .bind(question.question_type)
        .bind(question.difficulty)
        .bind(question.language)
        .bind(&question.question_text)
        .bind(question.options.clone().map(Json))
        .bind(question.correct_option)
        .bind(&question.correct_answer)
        .bind(&question.solution_code)
        .bind(&question.explanation)
        .bind(question.points)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || "Duplicate question".to_string(), "Category"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Question"));
        }
        self.required_question(id).await
    }

    async fn delete_question(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Question"));
        }
        Ok(())
    }

    async fn record_submission(&self, score: NewScore) -> RepoResult<(ScoreRecord, i64)> {
        // Ledger row and profile increment commit together or not at all.
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, ScoreRecord>(
            r#"
            INSERT INTO scores
            (user_id, question_id, points_awarded, time_taken, is_correct, submitted_answer)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, question_id, points_awarded, time_taken,
                      is_correct, submitted_answer, created_at
            "#,
        )
        .bind(score.user_id)
        .bind(score.question_id)
        .bind(score.points_awarded)
        .bind(score.time_taken)
        .bind(score.is_correct)
        .bind(&score.submitted_answer)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, || "Duplicate score".to_string(), "Question"))?;

        // Atomic increment: the row lock taken by UPDATE serializes concurrent submissions.
        let total_points = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE user_profiles
            SET total_points = total_points + $1, updated_at = NOW()
            WHERE user_id = $2
            RETURNING total_points
            "#,
        )
        .bind(i64::from(score.points_awarded))
        .bind(score.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Profile"))?;

        tx.commit().await?;

        Ok((record, total_points))
    }

    async fn purge_scores(&self) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM scores").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn standings(&self, since: Option<DateTime<Utc>>) -> RepoResult<Vec<LeaderboardEntry>> {
        let rows = match since {
            None => {
                sqlx::query_as::<_, StandingRow>(
                    r#"
                    SELECT u.id, u.username, p.avatar_url, p.total_points, p.badges
                    FROM users u
                    JOIN user_profiles p ON p.user_id = u.id
                    WHERE p.role = 'user'
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            Some(since) => {
                sqlx::query_as::<_, StandingRow>(
                    r#"
                    SELECT
                        u.id, u.username, p.avatar_url,
                        COALESCE(SUM(s.points_awarded), 0)::BIGINT AS total_points,
                        p.badges
                    FROM users u
                    JOIN user_profiles p ON p.user_id = u.id
                    LEFT JOIN scores s ON s.user_id = u.id AND s.created_at >= $1
                    WHERE p.role = 'user'
                    GROUP BY u.id, u.username, p.avatar_url, p.badges
                    "#,
                )
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }

    async fn create_challenge(
        &self,
        challenger_id: i64,
        opponent_id: Option<i64>,
        category_id: i64,
    ) -> RepoResult<Challenge> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO challenges (challenger_id, opponent_id, category_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(challenger_id)
        .bind(opponent_id)
        .bind(category_id)
        .bind(ChallengeStatus::Pending)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, || "Duplicate challenge".to_string(), "Category or opponent"))?;

        self.required_challenge(id).await
    }

    async fn challenges_for(&self, user_id: i64) -> RepoResult<Vec<Challenge>> {
        let sql = format!(
            "{CHALLENGE_SELECT} WHERE ch.challenger_id = $1 OR ch.opponent_id = $1 \
             ORDER BY ch.created_at DESC, ch.id DESC"
        );
        Ok(sqlx::query_as::<_, Challenge>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn challenge(&self, id: i64) -> RepoResult<Option<Challenge>> {
        let sql = format!("{CHALLENGE_SELECT} WHERE ch.id = $1");
        Ok(sqlx::query_as::<_, Challenge>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_challenge(&self, id: i64, update: ChallengeUpdate) -> RepoResult<Challenge> {
        let result = sqlx::query(
            r#"
            UPDATE challenges
            SET status = $1, winner_id = $2, started_at = $3, completed_at = $4
            WHERE id = $5 AND status = $6
            "#,
        )
        .bind(update.status)
        .bind(update.winner_id)
        .bind(update.started_at)
        .bind(update.completed_at)
        .bind(id)
        .bind(update.from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either gone, or another transition got there first.
            let current = self.required_challenge(id).await?;
            return Err(RepositoryError::Conflict(format!(
                "Challenge is {:?}, expected {:?}",
                current.status, update.from
            )));
        }
        self.required_challenge(id).await
    }

    async fn dashboard_stats(&self) -> RepoResult<DashboardStats> {
        let overview = DashboardOverview {
            total_users: self.count("SELECT COUNT(*) FROM users").await?,
            admin_users: self
                .count("SELECT COUNT(*) FROM user_profiles WHERE role = 'admin'")
                .await?,
            total_questions: self.count("SELECT COUNT(*) FROM questions").await?,
            total_categories: self.count("SELECT COUNT(*) FROM categories").await?,
            total_quiz_attempts: self.count("SELECT COUNT(*) FROM scores").await?,
            correct_attempts: self
                .count("SELECT COUNT(*) FROM scores WHERE is_correct")
                .await?,
        };

        let top_performers = sqlx::query_as::<_, TopPerformer>(
            r#"
            SELECT u.username, p.total_points AS points
            FROM users u
            JOIN user_profiles p ON p.user_id = u.id
            WHERE p.role = 'user'
            ORDER BY p.total_points DESC, u.id ASC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let recent_users = sqlx::query_as::<_, RecentUser>(
            "SELECT username, date_joined FROM users ORDER BY date_joined DESC, id DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await?;

        let questions_by_type = self
            .grouped_counts(
                "SELECT question_type::TEXT, COUNT(*) FROM questions GROUP BY question_type",
            )
            .await?;
        let questions_by_difficulty = self
            .grouped_counts("SELECT difficulty::TEXT, COUNT(*) FROM questions GROUP BY difficulty")
            .await?;

        Ok(DashboardStats {
            overview,
            top_performers,
            recent_users,
            questions_by_type,
            questions_by_difficulty,
        })
    }
}
