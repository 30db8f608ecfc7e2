// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, repository::QuizRepository};

/// Shared repository handle; Postgres in production, in-memory in tests.
pub type Repo = Arc<dyn QuizRepository>;

#[derive(Clone)]
pub struct AppState {
    pub repo: Repo,
    pub config: Config,
}

impl AppState {
    pub fn new(repo: Repo, config: Config) -> Self {
        Self { repo, config }
    }
}

impl FromRef<AppState> for Repo {
    fn from_ref(state: &AppState) -> Self {
        state.repo.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
