// tests/leaderboard_tests.rs

mod common;

use common::{mcq, spawn_app};
use quiz_arena::{
    models::{
        question::{Difficulty, Language, NewQuestion, QuestionType},
        score::NewScore,
        user::{NewAccount, Role},
    },
    repository::QuizRepository,
};
use serde_json::{Value, json};

async fn leaderboard(app: &common::TestApp, query: &str) -> Value {
    let response = app
        .client
        .get(app.url(&format!("/leaderboard/{}", query)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn ranks_players_and_excludes_admins() {
    let app = spawn_app().await;
    let (_, admin) = app.admin("root").await;
    let (alice_id, alice) = app.player("alice").await;
    let (bob_id, bob) = app.player("bob").await;
    let (carol_id, _) = app.player("carol").await;

    let category_id = app.create_category(&admin, "Networks").await["id"].as_i64().unwrap();
    let question_id = app.create_question(&admin, mcq(category_id, 10)).await["id"]
        .as_i64()
        .unwrap();

    // bob: 12, alice: 24
    app.submit(&bob, question_id, json!({ "answer": "2", "time_taken": 1 })).await;
    for _ in 0..2 {
        app.submit(&alice, question_id, json!({ "answer": "2", "time_taken": 1 })).await;
    }

    let body = leaderboard(&app, "").await;
    assert_eq!(body["period"], "overall");
    let entries = body["leaderboard"].as_array().unwrap();
    let ids: Vec<i64> = entries.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![alice_id, bob_id, carol_id]);
    assert_eq!(entries[0]["total_points"], 24);
    assert_eq!(entries[2]["total_points"], 0);
    assert!(entries.iter().all(|e| e["username"] != "root"));

    for period in ["daily", "weekly"] {
        let body = leaderboard(&app, &format!("?period={}", period)).await;
        assert_eq!(body["period"], period);
        let entries = body["leaderboard"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["id"], alice_id);
        assert_eq!(entries[0]["total_points"], 24);
    }
}

#[tokio::test]
async fn unknown_period_behaves_as_overall() {
    let app = spawn_app().await;
    app.player("alice").await;

    let body = leaderboard(&app, "?period=monthly").await;
    assert_eq!(body["period"], "monthly");
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn purge_resets_windows_but_not_totals() {
    let app = spawn_app().await;
    let (_, admin) = app.admin("root").await;
    let (_, alice) = app.player("alice").await;
    let category_id = app.create_category(&admin, "Networks").await["id"].as_i64().unwrap();
    let question_id = app.create_question(&admin, mcq(category_id, 10)).await["id"]
        .as_i64()
        .unwrap();
    app.submit(&alice, question_id, json!({ "answer": "2", "time_taken": 40 })).await;

    let response = app
        .client
        .delete(app.url("/admin/scores/"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted"], 1);

    let overall = leaderboard(&app, "?period=overall").await;
    assert_eq!(overall["leaderboard"][0]["total_points"], 10);
    let daily = leaderboard(&app, "?period=daily").await;
    assert_eq!(daily["leaderboard"][0]["total_points"], 0);

    // Period names are matched exactly; upper case reads as overall
    let shouted = leaderboard(&app, "?period=WEEKLY").await;
    assert_eq!(shouted["period"], "WEEKLY");
    assert_eq!(shouted["leaderboard"][0]["total_points"], 10);
}

#[tokio::test]
async fn caps_at_fifty_entries() {
    let app = spawn_app().await;
    let category = app
        .repo
        .create_category("Bulk", "bulk", "")
        .await
        .unwrap();
    let question = app
        .repo
        .create_question(NewQuestion {
            title: "Bulk".to_string(),
            category_id: category.id,
            question_type: QuestionType::Quick,
            difficulty: Difficulty::Easy,
            language: Language::General,
            question_text: "?".to_string(),
            options: None,
            correct_option: None,
            correct_answer: Some("x".to_string()),
            solution_code: None,
            explanation: String::new(),
            points: 1,
        })
        .await
        .unwrap();

    for i in 0..60 {
        let user = app
            .repo
            .create_account(NewAccount {
                username: format!("player{:02}", i),
                email: String::new(),
                password_hash: "unused".to_string(),
                role: if i % 10 == 0 { Role::Admin } else { Role::User },
            })
            .await
            .unwrap();
        app.repo
            .record_submission(NewScore {
                user_id: user.id,
                question_id: question.id,
                points_awarded: i,
                time_taken: 5,
                is_correct: true,
                submitted_answer: "x".to_string(),
            })
            .await
            .unwrap();
    }

    let body = leaderboard(&app, "").await;
    let entries = body["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 50);
    let points: Vec<i64> = entries
        .iter()
        .map(|e| e["total_points"].as_i64().unwrap())
        .collect();
    assert!(points.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(points[0], 59);
    assert!(entries.iter().all(|e| e["username"] != "player50"));
}
