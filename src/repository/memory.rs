// src/repository/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;

use super::{QuizRepository, RepoResult, RepositoryError};
use crate::models::{
    category::Category,
    challenge::{Challenge, ChallengeStatus, ChallengeUpdate},
    dashboard::{DashboardOverview, DashboardStats, RecentUser, TopPerformer},
    leaderboard::LeaderboardEntry,
    question::{NewQuestion, Question, QuestionFilter, QuestionType},
    score::{NewScore, ScoreRecord},
    user::{AdminUserResponse, NewAccount, Role, User, UserProfile},
};

#[derive(Debug, Clone)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    is_active: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct QuestionRow {
    id: i64,
    fields: NewQuestion,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ChallengeRow {
    id: i64,
    challenger_id: i64,
    opponent_id: Option<i64>,
    category_id: i64,
    status: ChallengeStatus,
    winner_id: Option<i64>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<i64, UserRow>,
    profiles: BTreeMap<i64, UserProfile>,
    categories: BTreeMap<i64, CategoryRow>,
    questions: BTreeMap<i64, QuestionRow>,
    scores: Vec<ScoreRecord>,
    challenges: BTreeMap<i64, ChallengeRow>,
    last_id: i64,
}

impl Store {
    /// One sequence shared by every table; ids only need to be unique per table.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: i64) -> Option<User> {
        let row = self.users.get(&id)?;
        let role = self.profiles.get(&id).map(|p| p.role).unwrap_or_default();
        Some(User {
            id: row.id,
            username: row.username.clone(),
            email: row.email.clone(),
            password: row.password.clone(),
            is_active: row.is_active,
            role,
            date_joined: row.date_joined,
            last_login: row.last_login,
        })
    }

    fn admin_user(&self, id: i64) -> Option<AdminUserResponse> {
        let row = self.users.get(&id)?;
        let profile = self.profiles.get(&id)?;
        Some(AdminUserResponse {
            id: row.id,
            username: row.username.clone(),
            email: row.email.clone(),
            is_active: row.is_active,
            role: profile.role,
            total_points: profile.total_points,
            date_joined: row.date_joined,
            last_login: row.last_login,
        })
    }

    fn username(&self, id: i64) -> Option<String> {
        self.users.get(&id).map(|u| u.username.clone())
    }

    fn category(&self, id: i64) -> Option<Category> {
        let row = self.categories.get(&id)?;
        let question_count = self
            .questions
            .values()
            .filter(|q| q.fields.category_id == id)
            .count() as i64;
        Some(Category {
            id: row.id,
            name: row.name.clone(),
            slug: row.slug.clone(),
            description: row.description.clone(),
            question_count,
            created_at: row.created_at,
        })
    }

    fn question(&self, id: i64) -> Option<Question> {
        let row = self.questions.get(&id)?;
        let category_name = self.categories.get(&row.fields.category_id)?.name.clone();
        let q = &row.fields;
        Some(Question {
            id: row.id,
            title: q.title.clone(),
            category_id: q.category_id,
            category_name,
            question_type: q.question_type,
            difficulty: q.difficulty,
            language: q.language,
            question_text: q.question_text.clone(),
            options: q.options.clone().map(Json),
            correct_option: q.correct_option,
            correct_answer: q.correct_answer.clone(),
            solution_code: q.solution_code.clone(),
            explanation: q.explanation.clone(),
            points: q.points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn challenge(&self, id: i64) -> Option<Challenge> {
        let row = self.challenges.get(&id)?;
        Some(Challenge {
            id: row.id,
            challenger_id: row.challenger_id,
            challenger_name: self.username(row.challenger_id)?,
            opponent_id: row.opponent_id,
            opponent_name: row.opponent_id.and_then(|id| self.username(id)),
            category_id: row.category_id,
            category_name: self.categories.get(&row.category_id)?.name.clone(),
            status: row.status,
            winner_id: row.winner_id,
            winner_name: row.winner_id.and_then(|id| self.username(id)),
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }

    fn name_taken(&self, name: &str, slug: &str, except: Option<i64>) -> bool {
        self.categories
            .values()
            .any(|c| Some(c.id) != except && (c.name == name || c.slug == slug))
    }

    fn check_question_refs(&self, question: &NewQuestion) -> RepoResult<()> {
        if self.categories.contains_key(&question.category_id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound("Category"))
        }
    }
}

/// In-process repository used by tests and database-less runs.
///
/// Mirrors the relational rules of the Postgres schema: unique names,
/// cascading deletes and the atomic ledger write.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for MemoryRepository {
    async fn create_account(&self, account: NewAccount) -> RepoResult<User> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.username == account.username) {
            return Err(RepositoryError::Conflict(format!(
                "Username '{}' already exists",
                account.username
            )));
        }

        let id = store.next_id();
        let now = Utc::now();
        store.users.insert(
            id,
            UserRow {
                id,
                username: account.username,
                email: account.email,
                password: account.password_hash,
                is_active: true,
                date_joined: now,
                last_login: None,
            },
        );
        store.profiles.insert(
            id,
            UserProfile {
                user_id: id,
                total_points: 0,
                badges: Json(Vec::new()),
                avatar_url: None,
                bio: String::new(),
                role: account.role,
                created_at: now,
                updated_at: now,
            },
        );

        store.user(id).ok_or(RepositoryError::NotFound("User"))
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.store.read().await.user(id))
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        let id = store
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id);
        Ok(id.and_then(|id| store.user(id)))
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        if let Some(user) = self.store.write().await.users.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn profile(&self, user_id: i64) -> RepoResult<Option<UserProfile>> {
        Ok(self.store.read().await.profiles.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: i64,
        avatar_url: Option<String>,
        bio: Option<String>,
    ) -> RepoResult<UserProfile> {
        let mut store = self.store.write().await;
        let profile = store
            .profiles
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound("Profile"))?;

        if let Some(avatar_url) = avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
        if let Some(bio) = bio {
            profile.bio = bio;
        }
        profile.updated_at = Utc::now();

        Ok(profile.clone())
    }

    async fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<AdminUserResponse>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .keys()
            .rev()
            .filter_map(|id| store.admin_user(*id))
            .filter(|u| role.is_none_or(|r| u.role == r))
            .collect())
    }

    async fn admin_user(&self, id: i64) -> RepoResult<Option<AdminUserResponse>> {
        Ok(self.store.read().await.admin_user(id))
    }

    async fn toggle_active(&self, id: i64) -> RepoResult<AdminUserResponse> {
        let mut store = self.store.write().await;
        let user = store
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("User"))?;
        user.is_active = !user.is_active;

        store.admin_user(id).ok_or(RepositoryError::NotFound("User"))
    }

    async fn set_role(&self, id: i64, role: Role) -> RepoResult<AdminUserResponse> {
        let mut store = self.store.write().await;
        let profile = store
            .profiles
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("User"))?;
        profile.role = role;
        profile.updated_at = Utc::now();

        store.admin_user(id).ok_or(RepositoryError::NotFound("User"))
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let store = self.store.read().await;
        let mut categories: Vec<Category> = store
            .categories
            .keys()
            .filter_map(|id| store.category(*id))
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.store.read().await.category(id))
    }

    async fn category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let store = self.store.read().await;
        let id = store
            .categories
            .values()
            .find(|c| c.slug == slug)
            .map(|c| c.id);
        Ok(id.and_then(|id| store.category(id)))
    }

    async fn create_category(&self, name: &str, slug: &str, description: &str) -> RepoResult<Category> {
        let mut store = self.store.write().await;

        if store.name_taken(name, slug, None) {
            return Err(RepositoryError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let id = store.next_id();
        store.categories.insert(
            id,
            CategoryRow {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
                created_at: Utc::now(),
            },
        );

        store.category(id).ok_or(RepositoryError::NotFound("Category"))
    }

    async fn update_category(&self, id: i64, name: &str, description: &str) -> RepoResult<Category> {
        let mut store = self.store.write().await;

        if store.categories.values().any(|c| c.id != id && c.name == name) {
            return Err(RepositoryError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let row = store
            .categories
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("Category"))?;
        row.name = name.to_string();
        row.description = description.to_string();

        store.category(id).ok_or(RepositoryError::NotFound("Category"))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<()> {
        let mut store = self.store.write().await;

        if store.categories.remove(&id).is_none() {
            return Err(RepositoryError::NotFound("Category"));
        }

        let removed: Vec<i64> = store
            .questions
            .values()
            .filter(|q| q.fields.category_id == id)
            .map(|q| q.id)
            .collect();
        store.questions.retain(|_, q| q.fields.category_id != id);
        store.scores.retain(|s| !removed.contains(&s.question_id));
        store.challenges.retain(|_, c| c.category_id != id);

        Ok(())
    }

    async fn list_questions(
        &self,
        category_id: Option<i64>,
        filter: QuestionFilter,
    ) -> RepoResult<Vec<Question>> {
        let store = self.store.read().await;

        let mut questions: Vec<Question> = store
            .questions
            .values()
            .filter(|row| category_id.is_none_or(|c| row.fields.category_id == c))
            .filter(|row| filter.difficulty.is_none_or(|d| row.fields.difficulty == d))
            .filter(|row| filter.question_type.is_none_or(|t| row.fields.question_type == t))
            .filter_map(|row| store.question(row.id))
            .collect();

        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            questions.truncate(limit);
        }
        Ok(questions)
    }

    async fn question(&self, id: i64) -> RepoResult<Option<Question>> {
        Ok(self.store.read().await.question(id))
    }

    async fn create_question(&self, question: NewQuestion) -> RepoResult<Question> {
        let mut store = self.store.write().await;
        store.check_question_refs(&question)?;

        let id = store.next_id();
        let now = Utc::now();
        store.questions.insert(
            id,
            QuestionRow {
                id,
                fields: question,
                created_at: now,
                updated_at: now,
            },
        );

        store.question(id).ok_or(RepositoryError::NotFound("Question"))
    }

    async fn update_question(&self, id: i64, question: NewQuestion) -> RepoResult<Question> {
        let mut store = self.store.write().await;
        store.check_question_refs(&question)?;

        let row = store
            .questions
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("Question"))?;
        row.fields = question;
        row.updated_at = Utc::now();

        store.question(id).ok_or(RepositoryError::NotFound("Question"))
    }

    async fn delete_question(&self, id: i64) -> RepoResult<()> {
        let mut store = self.store.write().await;

        if store.questions.remove(&id).is_none() {
            return Err(RepositoryError::NotFound("Question"));
        }
        store.scores.retain(|s| s.question_id != id);

        Ok(())
    }

    async fn record_submission(&self, score: NewScore) -> RepoResult<(ScoreRecord, i64)> {
        // Both writes happen under one write guard.
        let mut store = self.store.write().await;

        if !store.questions.contains_key(&score.question_id) {
            return Err(RepositoryError::NotFound("Question"));
        }
        if !store.profiles.contains_key(&score.user_id) {
            return Err(RepositoryError::NotFound("Profile"));
        }

        let id = store.next_id();
        let now = Utc::now();
        let record = ScoreRecord {
            id,
            user_id: score.user_id,
            question_id: score.question_id,
            points_awarded: score.points_awarded,
            time_taken: score.time_taken,
            is_correct: score.is_correct,
            submitted_answer: score.submitted_answer,
            created_at: now,
        };
        store.scores.push(record.clone());

        let profile = store
            .profiles
            .get_mut(&score.user_id)
            .ok_or(RepositoryError::NotFound("Profile"))?;
        profile.total_points += i64::from(score.points_awarded);
        profile.updated_at = now;

        Ok((record, profile.total_points))
    }

    async fn purge_scores(&self) -> RepoResult<u64> {
        let mut store = self.store.write().await;
        let removed = store.scores.len() as u64;
        store.scores.clear();
        Ok(removed)
    }

    async fn standings(&self, since: Option<DateTime<Utc>>) -> RepoResult<Vec<LeaderboardEntry>> {
        let store = self.store.read().await;

        let entries = store
            .profiles
            .values()
            .filter(|p| p.role == Role::User)
            .filter_map(|p| {
                let user = store.users.get(&p.user_id)?;
                let total_points = match since {
                    None => p.total_points,
                    Some(since) => store
                        .scores
                        .iter()
                        .filter(|s| s.user_id == p.user_id && s.created_at >= since)
                        .map(|s| i64::from(s.points_awarded))
                        .sum(),
                };
                Some(LeaderboardEntry {
                    id: user.id,
                    username: user.username.clone(),
                    avatar_url: p.avatar_url.clone(),
                    total_points,
                    badges: p.badges.0.clone(),
                })
            })
            .collect();

        Ok(entries)
    }

    async fn create_challenge(
        &self,
        challenger_id: i64,
        opponent_id: Option<i64>,
        category_id: i64,
    ) -> RepoResult<Challenge> {
        let mut store = self.store.write().await;

        if !store.categories.contains_key(&category_id) {
            return Err(RepositoryError::NotFound("Category"));
        }
        let participants = std::iter::once(challenger_id).chain(opponent_id);
        for user_id in participants {
            if !store.users.contains_key(&user_id) {
                return Err(RepositoryError::NotFound("User"));
            }
        }

        let id = store.next_id();
        store.challenges.insert(
            id,
            ChallengeRow {
                id,
                challenger_id,
                opponent_id,
                category_id,
                status: ChallengeStatus::Pending,
                winner_id: None,
                created_at: Utc::now(),
                started_at: None,
                completed_at: None,
            },
        );

        store.challenge(id).ok_or(RepositoryError::NotFound("Challenge"))
    }

    async fn challenges_for(&self, user_id: i64) -> RepoResult<Vec<Challenge>> {
        let store = self.store.read().await;

        let mut challenges: Vec<Challenge> = store
            .challenges
            .values()
            .filter(|c| c.challenger_id == user_id || c.opponent_id == Some(user_id))
            .filter_map(|c| store.challenge(c.id))
            .collect();
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(challenges)
    }

    async fn challenge(&self, id: i64) -> RepoResult<Option<Challenge>> {
        Ok(self.store.read().await.challenge(id))
    }

    async fn update_challenge(&self, id: i64, update: ChallengeUpdate) -> RepoResult<Challenge> {
        let mut store = self.store.write().await;
        let row = store
            .challenges
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("Challenge"))?;

        if row.status != update.from {
            return Err(RepositoryError::Conflict(format!(
                "Challenge is {:?}, expected {:?}",
                row.status, update.from
            )));
        }

        row.status = update.status;
        row.winner_id = update.winner_id;
        row.started_at = update.started_at;
        row.completed_at = update.completed_at;

        store.challenge(id).ok_or(RepositoryError::NotFound("Challenge"))
    }

    async fn dashboard_stats(&self) -> RepoResult<DashboardStats> {
        let store = self.store.read().await;

        let overview = DashboardOverview {
            total_users: store.users.len() as i64,
            admin_users: store
                .profiles
                .values()
                .filter(|p| p.role == Role::Admin)
                .count() as i64,
            total_questions: store.questions.len() as i64,
            total_categories: store.categories.len() as i64,
            total_quiz_attempts: store.scores.len() as i64,
            correct_attempts: store.scores.iter().filter(|s| s.is_correct).count() as i64,
        };

        let mut players: Vec<(&UserProfile, &UserRow)> = store
            .profiles
            .values()
            .filter(|p| p.role == Role::User)
            .filter_map(|p| Some((p, store.users.get(&p.user_id)?)))
            .collect();
        players.sort_by(|a, b| {
            b.0.total_points
                .cmp(&a.0.total_points)
                .then(a.1.id.cmp(&b.1.id))
        });
        let top_performers = players
            .into_iter()
            .take(5)
            .map(|(p, u)| TopPerformer {
                username: u.username.clone(),
                points: p.total_points,
            })
            .collect();

        let mut recent: Vec<&UserRow> = store.users.values().collect();
        recent.sort_by(|a, b| b.date_joined.cmp(&a.date_joined).then(b.id.cmp(&a.id)));
        let recent_users = recent
            .into_iter()
            .take(5)
            .map(|u| RecentUser {
                username: u.username.clone(),
                date_joined: u.date_joined,
            })
            .collect();

        let mut questions_by_type = BTreeMap::new();
        let mut questions_by_difficulty = BTreeMap::new();
        for row in store.questions.values() {
            let type_key = match row.fields.question_type {
                QuestionType::Mcq => "MCQ",
                QuestionType::Quick => "QUICK",
                QuestionType::Coding => "CODING",
            };
            *questions_by_type.entry(type_key.to_string()).or_insert(0) += 1;

            let difficulty_key = format!("{:?}", row.fields.difficulty).to_uppercase();
            *questions_by_difficulty.entry(difficulty_key).or_insert(0) += 1;
        }

        Ok(DashboardStats {
            overview,
            top_performers,
            recent_users,
            questions_by_type,
            questions_by_difficulty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Difficulty, Language};

    fn account(username: &str, role: Role) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: String::new(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    fn quick_question(category_id: i64) -> NewQuestion {
        NewQuestion {
            title: "Capital".to_string(),
            category_id,
            question_type: QuestionType::Quick,
            difficulty: Difficulty::Easy,
            language: Language::General,
            question_text: "Capital of France?".to_string(),
            options: None,
            correct_option: None,
            correct_answer: Some("Paris".to_string()),
            solution_code: None,
            explanation: String::new(),
            points: 10,
        }
    }

    fn score(user_id: i64, question_id: i64, points: i32) -> NewScore {
        NewScore {
            user_id,
            question_id,
            points_awarded: points,
            time_taken: 5,
            is_correct: points > 0,
            submitted_answer: "Paris".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let repo = MemoryRepository::new();
        repo.create_account(account("alice", Role::User)).await.unwrap();
        let err = repo.create_account(account("alice", Role::User)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn submission_appends_and_accumulates() {
        let repo = MemoryRepository::new();
        let user = repo.create_account(account("alice", Role::User)).await.unwrap();
        let cat = repo.create_category("Geo", "geo", "").await.unwrap();
        let q = repo.create_question(quick_question(cat.id)).await.unwrap();

        let (_, total) = repo.record_submission(score(user.id, q.id, 12)).await.unwrap();
        assert_eq!(total, 12);
        let (record, total) = repo.record_submission(score(user.id, q.id, 12)).await.unwrap();
        assert_eq!(total, 24);
        assert_eq!(record.question_id, q.id);

        let profile = repo.profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.total_points, 24);
    }

    #[tokio::test]
    async fn standings_skip_admins_and_honor_window() {
        let repo = MemoryRepository::new();
        let alice = repo.create_account(account("alice", Role::User)).await.unwrap();
        repo.create_account(account("root", Role::Admin)).await.unwrap();
        let cat = repo.create_category("Geo", "geo", "").await.unwrap();
        let q = repo.create_question(quick_question(cat.id)).await.unwrap();
        repo.record_submission(score(alice.id, q.id, 10)).await.unwrap();

        let overall = repo.standings(None).await.unwrap();
        assert_eq!(overall.len(), 1);
        assert_eq!(overall[0].total_points, 10);

        let future = Utc::now() + chrono::Duration::hours(1);
        let windowed = repo.standings(Some(future)).await.unwrap();
        assert_eq!(windowed[0].total_points, 0);
    }

    #[tokio::test]
    async fn purge_keeps_profile_totals() {
        let repo = MemoryRepository::new();
        let alice = repo.create_account(account("alice", Role::User)).await.unwrap();
        let cat = repo.create_category("Geo", "geo", "").await.unwrap();
        let q = repo.create_question(quick_question(cat.id)).await.unwrap();
        repo.record_submission(score(alice.id, q.id, 10)).await.unwrap();

        assert_eq!(repo.purge_scores().await.unwrap(), 1);
        assert_eq!(repo.profile(alice.id).await.unwrap().unwrap().total_points, 10);
        let daily = repo.standings(Some(Utc::now() - chrono::Duration::days(1))).await.unwrap();
        assert_eq!(daily[0].total_points, 0);
    }

    #[tokio::test]
    async fn deleting_category_cascades() {
        let repo = MemoryRepository::new();
        let alice = repo.create_account(account("alice", Role::User)).await.unwrap();
        let cat = repo.create_category("Geo", "geo", "").await.unwrap();
        let q = repo.create_question(quick_question(cat.id)).await.unwrap();
        repo.record_submission(score(alice.id, q.id, 10)).await.unwrap();
        repo.create_challenge(alice.id, None, cat.id).await.unwrap();

        repo.delete_category(cat.id).await.unwrap();

        assert!(repo.question(q.id).await.unwrap().is_none());
        assert!(repo.challenges_for(alice.id).await.unwrap().is_empty());
        assert_eq!(repo.dashboard_stats().await.unwrap().overview.total_quiz_attempts, 0);
    }

    #[tokio::test]
    async fn question_requires_existing_category() {
        let repo = MemoryRepository::new();
        let err = repo.create_question(quick_question(404)).await.unwrap_err();
        assert_eq!(err, RepositoryError::NotFound("Category"));
    }

    #[tokio::test]
    async fn concurrent_submissions_are_not_lost() {
        let repo = std::sync::Arc::new(MemoryRepository::new());
        let alice = repo.create_account(account("alice", Role::User)).await.unwrap();
        let cat = repo.create_category("Geo", "geo", "").await.unwrap();
        let q = repo.create_question(quick_question(cat.id)).await.unwrap();
        let (user_id, question_id) = (alice.id, q.id);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.record_submission(score(user_id, question_id, 7)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let profile = repo.profile(alice.id).await.unwrap().unwrap();
        assert_eq!(profile.total_points, 32 * 7);
        assert_eq!(repo.store.read().await.scores.len(), 32);
    }

    #[tokio::test]
    async fn stale_transition_is_rejected() {
        use crate::domain::challenge::plan_transition;

        let repo = MemoryRepository::new();
        let alice = repo.create_account(account("alice", Role::User)).await.unwrap();
        let cat = repo.create_category("Geo", "geo", "").await.unwrap();
        let pending = repo.create_challenge(alice.id, None, cat.id).await.unwrap();

        // Both planned against the same PENDING snapshot
        let cancel = plan_transition(&pending, ChallengeStatus::Cancelled, None, Utc::now()).unwrap();
        let start = plan_transition(&pending, ChallengeStatus::Active, None, Utc::now()).unwrap();

        repo.update_challenge(pending.id, cancel).await.unwrap();
        let err = repo.update_challenge(pending.id, start).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let stored = repo.challenge(pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ChallengeStatus::Cancelled);
        assert_eq!(stored.started_at, None);
    }
}
