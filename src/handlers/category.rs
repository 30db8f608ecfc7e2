// src/handlers/category.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::question::{PublicQuestion, QuestionListParams},
    state::Repo,
};

/// Lists all categories with their question counts, ordered by name.
pub async fn list_categories(State(repo): State<Repo>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(repo.list_categories().await?))
}

pub async fn get_category(
    State(repo): State<Repo>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let category = repo
        .category_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Questions of one category, without answer keys.
///
/// Supports `difficulty`, `type` and `limit` query parameters.
pub async fn category_questions(
    State(repo): State<Repo>,
    Path(slug): Path<String>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let category = repo
        .category_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    let Some(filter) = params.filter() else {
        return Ok(Json(Vec::<PublicQuestion>::new()));
    };

    let questions = repo
        .list_questions(Some(category.id), filter)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect::<Vec<_>>();

    Ok(Json(questions))
}
