// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quiz_arena::{
    config::Config,
    models::user::{NewAccount, Role},
    repository::{MemoryRepository, QuizRepository},
    routes,
    state::{AppState, Repo},
    utils::hash::hash_password,
};
use serde_json::{Value, json};

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub repo: Repo,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let repo: Repo = Arc::new(MemoryRepository::new());
    let config = Config::for_tests("test_secret_for_integration_tests");
    let state = AppState::new(repo.clone(), config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        repo,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    pub async fn register(&self, username: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/register/"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
                "password2": PASSWORD
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str) -> Value {
        let response = self
            .client
            .post(self.url("/auth/login/"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200, "login failed for {}", username);
        response.json().await.unwrap()
    }

    /// Registers a player and returns `(user id, access token)`.
    pub async fn player(&self, username: &str) -> (i64, String) {
        let body: Value = self.register(username).await.json().await.unwrap();
        let id = body["id"].as_i64().unwrap();
        let tokens = self.login(username).await;
        (id, tokens["access"].as_str().unwrap().to_string())
    }

    /// Seeds an admin straight into the store, then logs in through the API.
    pub async fn admin(&self, username: &str) -> (i64, String) {
        let user = self
            .repo
            .create_account(NewAccount {
                username: username.to_string(),
                email: String::new(),
                password_hash: hash_password(PASSWORD).unwrap(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        let tokens = self.login(username).await;
        (user.id, tokens["access"].as_str().unwrap().to_string())
    }

    pub async fn create_category(&self, admin_token: &str, name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/admin/categories/"))
            .bearer_auth(admin_token)
            .json(&json!({ "name": name, "description": "Test category" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn create_question(&self, admin_token: &str, question: Value) -> Value {
        let response = self
            .client
            .post(self.url("/admin/questions/"))
            .bearer_auth(admin_token)
            .json(&question)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn submit(&self, token: &str, question_id: i64, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/questions/{}/submit/", question_id)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

pub fn mcq(category_id: i64, points: i32) -> Value {
    json!({
        "title": "HTTPS port",
        "category": category_id,
        "question_type": "MCQ",
        "difficulty": "EASY",
        "question_text": "Which port does HTTPS use by default?",
        "options": ["21", "80", "443", "8080"],
        "correct_option": 2,
        "explanation": "HTTPS defaults to port 443.",
        "points": points
    })
}

pub fn quick(category_id: i64, answer: &str) -> Value {
    json!({
        "title": "Boolean",
        "category": category_id,
        "question_type": "QUICK",
        "difficulty": "HARD",
        "question_text": "Is the empty list truthy in Python?",
        "correct_answer": answer,
        "points": 10
    })
}
