// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    domain::{access::Principal, challenge::plan_transition},
    error::AppError,
    extractors::ValidatedJson,
    models::{
        category::CategoryRequest,
        challenge::ChallengeTransitionRequest,
        question::{NewQuestion, QuestionListParams, QuestionRequest},
        user::{ChangeRoleRequest, Role, UserListParams},
    },
    state::Repo,
    utils::slug::slugify,
};

// Questions

/// Lists questions with their answer keys.
/// Admin only.
pub async fn list_questions(
    State(repo): State<Repo>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = match params.filter() {
        Some(filter) => repo.list_questions(None, filter).await?,
        None => Vec::new(),
    };
    Ok(Json(questions))
}

pub async fn get_question(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = repo
        .question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;
    Ok(Json(question))
}

/// Creates a question.
/// Admin only. Text fields are stored as written; rendering escapes them.
pub async fn create_question(
    State(repo): State<Repo>,
    ValidatedJson(payload): ValidatedJson<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = repo.create_question(new_question(payload)).await?;
    tracing::info!("Created question {} in category {}", question.id, question.category_id);
    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces a question.
/// Admin only.
pub async fn update_question(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = repo.update_question(id, new_question(payload)).await?;
    Ok(Json(question))
}

/// Deletes a question and its score records.
/// Admin only.
pub async fn delete_question(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    repo.delete_question(id).await?;
    tracing::info!("Deleted question {}", id);
    Ok(StatusCode::NO_CONTENT)
}

fn new_question(payload: QuestionRequest) -> NewQuestion {
    NewQuestion {
        title: payload.title.trim().to_string(),
        category_id: payload.category,
        question_type: payload.question_type,
        difficulty: payload.difficulty,
        language: payload.language,
        question_text: payload.question_text,
        options: payload.options,
        correct_option: payload.correct_option,
        correct_answer: payload.correct_answer,
        solution_code: payload.solution_code,
        explanation: payload.explanation,
        points: payload.points,
    }
}

// Categories

pub async fn list_categories(State(repo): State<Repo>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(repo.list_categories().await?))
}

pub async fn get_category(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = repo
        .category(id)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;
    Ok(Json(category))
}

/// Creates a category; the slug is derived from the name.
/// Admin only.
pub async fn create_category(
    State(repo): State<Repo>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim();
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "Category name must contain letters or digits".to_string(),
        ));
    }

    let category = repo
        .create_category(name, &slug, &payload.description)
        .await?;

    tracing::info!("Created category '{}' ({})", category.name, category.slug);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Renames or re-describes a category. The slug stays as created.
/// Admin only.
pub async fn update_category(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = repo
        .update_category(id, payload.name.trim(), &payload.description)
        .await?;
    Ok(Json(category))
}

/// Deletes a category together with its questions, their scores and its challenges.
/// Admin only.
pub async fn delete_category(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    repo.delete_category(id).await?;
    tracing::info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// Users

/// Lists all accounts, newest first, optionally filtered by `role`.
/// Admin only.
pub async fn list_users(
    State(repo): State<Repo>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let role = match params.role.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(raw) => Some(raw.parse::<Role>().map_err(AppError::BadRequest)?),
        None => None,
    };
    Ok(Json(repo.list_users(role).await?))
}

pub async fn get_user(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = repo
        .admin_user(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// Activates or deactivates an account.
/// Admin only. Prevents locking yourself out.
pub async fn toggle_active(
    State(repo): State<Repo>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == principal.user_id {
        return Err(AppError::BadRequest(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    let user = repo.toggle_active(id).await?;
    tracing::info!(
        "Admin {} set user {} active={}",
        principal.user_id,
        user.id,
        user.is_active
    );
    Ok(Json(user))
}

/// Changes an account's role.
/// Admin only. Prevents demoting yourself.
pub async fn change_role(
    State(repo): State<Repo>,
    principal: Principal,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<ChangeRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = payload.role.parse::<Role>().map_err(AppError::BadRequest)?;

    if id == principal.user_id && role != Role::Admin {
        return Err(AppError::BadRequest("Cannot demote yourself".to_string()));
    }

    let user = repo.set_role(id, role).await?;
    tracing::info!(
        "Admin {} changed role of user {} to {}",
        principal.user_id,
        user.id,
        role.as_str()
    );
    Ok(Json(user))
}

// Dashboard & maintenance

pub async fn dashboard_stats(State(repo): State<Repo>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(repo.dashboard_stats().await?))
}

/// Removes every score record. Profile totals are kept, so only the
/// daily/weekly leaderboards reset.
/// Admin only.
pub async fn purge_scores(
    State(repo): State<Repo>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    let deleted = repo.purge_scores().await?;
    tracing::warn!("Admin {} purged {} score records", principal.user_id, deleted);
    Ok(Json(json!({ "deleted": deleted })))
}

/// Moves a challenge along its lifecycle.
/// Admin only.
pub async fn transition_challenge(
    State(repo): State<Repo>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<ChallengeTransitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let challenge = repo
        .challenge(id)
        .await?
        .ok_or(AppError::NotFound("Challenge not found".to_string()))?;

    let update = plan_transition(&challenge, payload.status, payload.winner, Utc::now())?;
    let challenge = repo.update_challenge(id, update).await?;

    tracing::info!("Challenge {} is now {:?}", challenge.id, challenge.status);
    Ok(Json(challenge))
}
