// tests/postgres_tests.rs

//! Runs the Postgres adapter against a real database.
//! Each test is skipped when DATABASE_URL is not set.

use std::sync::Arc;

use chrono::{Duration, Utc};
use quiz_arena::{
    domain::challenge::plan_transition,
    models::{
        challenge::ChallengeStatus,
        leaderboard::LeaderboardEntry,
        question::{Difficulty, Language, NewQuestion, QuestionFilter, QuestionType},
        score::NewScore,
        user::{NewAccount, Role, User},
    },
    repository::{PgRepository, QuizRepository, RepositoryError},
};
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Connects and migrates, or returns `None` when no database is configured.
async fn connect() -> Option<(PgPool, Arc<PgRepository>)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    let repo = PgRepository::new(pool.clone());
    repo.migrate().await.expect("Failed to migrate database");

    Some((pool, Arc::new(repo)))
}

/// Tests share one database, so every name carries a random suffix.
fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..12])
}

async fn account(repo: &PgRepository, role: Role) -> User {
    repo.create_account(NewAccount {
        username: unique("user"),
        email: String::new(),
        password_hash: "hash".to_string(),
        role,
    })
    .await
    .unwrap()
}

/// Creates a category with one QUICK question; returns `(category id, question id)`.
async fn question(repo: &PgRepository) -> (i64, i64) {
    let name = unique("cat");
    let category = repo.create_category(&name, &name, "").await.unwrap();
    let question = repo
        .create_question(NewQuestion {
            title: "Capital".to_string(),
            category_id: category.id,
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
        })
        .await
        .unwrap();
    (category.id, question.id)
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

fn points(entries: &[LeaderboardEntry], id: i64) -> Option<i64> {
    entries.iter().find(|e| e.id == id).map(|e| e.total_points)
}

async fn ledger_rows(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM scores WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn submission_appends_and_accumulates() {
    let Some((pool, repo)) = connect().await else { return };
    let alice = account(&repo, Role::User).await;
    let (_, question_id) = question(&repo).await;

    let (first, total) = repo.record_submission(score(alice.id, question_id, 12)).await.unwrap();
    assert_eq!(total, 12);
    assert_eq!(first.points_awarded, 12);

    let (_, total) = repo.record_submission(score(alice.id, question_id, 24)).await.unwrap();
    assert_eq!(total, 36);

    let profile = repo.profile(alice.id).await.unwrap().unwrap();
    assert_eq!(profile.total_points, 36);
    assert_eq!(ledger_rows(&pool, alice.id).await, 2);
}

#[tokio::test]
async fn concurrent_submissions_are_not_lost() {
    let Some((pool, repo)) = connect().await else { return };
    let alice = account(&repo, Role::User).await;
    let (_, question_id) = question(&repo).await;
    let user_id = alice.id;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.record_submission(score(user_id, question_id, 5)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let profile = repo.profile(user_id).await.unwrap().unwrap();
    assert_eq!(profile.total_points, 16 * 5);
    assert_eq!(ledger_rows(&pool, user_id).await, 16);
}

#[tokio::test]
async fn standings_respect_window_and_skip_admins() {
    let Some((pool, repo)) = connect().await else { return };
    let alice = account(&repo, Role::User).await;
    let idle = account(&repo, Role::User).await;
    let admin = account(&repo, Role::Admin).await;
    let (_, question_id) = question(&repo).await;

    let (old, _) = repo.record_submission(score(alice.id, question_id, 30)).await.unwrap();
    repo.record_submission(score(alice.id, question_id, 8)).await.unwrap();
    repo.record_submission(score(admin.id, question_id, 50)).await.unwrap();

    // Backdate one score out of the daily window but inside the weekly one
    sqlx::query("UPDATE scores SET created_at = NOW() - INTERVAL '3 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .unwrap();

    let overall = repo.standings(None).await.unwrap();
    assert_eq!(points(&overall, alice.id), Some(38));
    assert_eq!(points(&overall, idle.id), Some(0));
    assert_eq!(points(&overall, admin.id), None);

    let now = Utc::now();
    let daily = repo.standings(Some(now - Duration::days(1))).await.unwrap();
    assert_eq!(points(&daily, alice.id), Some(8));
    assert_eq!(points(&daily, idle.id), Some(0));
    assert_eq!(points(&daily, admin.id), None);

    let weekly = repo.standings(Some(now - Duration::weeks(1))).await.unwrap();
    assert_eq!(points(&weekly, alice.id), Some(38));
}

#[tokio::test]
async fn category_delete_cascades() {
    let Some((pool, repo)) = connect().await else { return };
    let alice = account(&repo, Role::User).await;
    let (category_id, question_id) = question(&repo).await;
    repo.record_submission(score(alice.id, question_id, 10)).await.unwrap();
    repo.create_challenge(alice.id, None, category_id).await.unwrap();

    repo.delete_category(category_id).await.unwrap();

    assert!(repo.category(category_id).await.unwrap().is_none());
    assert!(repo.question(question_id).await.unwrap().is_none());
    assert!(repo.challenges_for(alice.id).await.unwrap().is_empty());
    assert_eq!(ledger_rows(&pool, alice.id).await, 0);
    // Totals are a running sum, not a view over the ledger
    assert_eq!(repo.profile(alice.id).await.unwrap().unwrap().total_points, 10);

    let err = repo.delete_category(category_id).await.unwrap_err();
    assert_eq!(err, RepositoryError::NotFound("Category"));
}

#[tokio::test]
async fn write_errors_are_mapped() {
    let Some((_, repo)) = connect().await else { return };
    let alice = account(&repo, Role::User).await;

    let err = repo
        .create_account(NewAccount {
            username: alice.username.clone(),
            email: String::new(),
            password_hash: "hash".to_string(),
            role: Role::User,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let (category_id, _) = question(&repo).await;
    let category = repo.category(category_id).await.unwrap().unwrap();
    let err = repo
        .create_category(&category.name, &unique("slug"), "")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let err = repo.create_challenge(alice.id, None, -1).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn enums_round_trip_through_filters() {
    let Some((_, repo)) = connect().await else { return };
    let (category_id, question_id) = question(&repo).await;

    let quick = repo
        .list_questions(
            Some(category_id),
            QuestionFilter {
                difficulty: Some(Difficulty::Easy),
                question_type: Some(QuestionType::Quick),
                limit: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(quick.len(), 1);
    assert_eq!(quick[0].id, question_id);
    assert_eq!(quick[0].question_type, QuestionType::Quick);

    let hard = repo
        .list_questions(
            Some(category_id),
            QuestionFilter {
                difficulty: Some(Difficulty::Hard),
                ..QuestionFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(hard.is_empty());
}

#[tokio::test]
async fn stale_transition_is_rejected() {
    let Some((_, repo)) = connect().await else { return };
    let alice = account(&repo, Role::User).await;
    let (category_id, _) = question(&repo).await;
    let pending = repo.create_challenge(alice.id, None, category_id).await.unwrap();

    let cancel = plan_transition(&pending, ChallengeStatus::Cancelled, None, Utc::now()).unwrap();
    let start = plan_transition(&pending, ChallengeStatus::Active, None, Utc::now()).unwrap();

    let cancelled = repo.update_challenge(pending.id, cancel).await.unwrap();
    assert_eq!(cancelled.status, ChallengeStatus::Cancelled);
    assert!(cancelled.completed_at.is_some());

    let err = repo.update_challenge(pending.id, start).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
    let stored = repo.challenge(pending.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ChallengeStatus::Cancelled);
}
