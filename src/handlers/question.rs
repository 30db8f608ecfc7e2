// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    domain::{access::Principal, grader::grade},
    error::AppError,
    extractors::ValidatedJson,
    models::{
        question::{PublicQuestion, QuestionListParams},
        score::{NewScore, SubmissionRequest, SubmissionResponse},
    },
    state::Repo,
};

/// Lists questions across all categories, newest first, without answer keys.
pub async fn list_questions(
    State(repo): State<Repo>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let Some(filter) = params.filter() else {
        return Ok(Json(Vec::<PublicQuestion>::new()));
    };

    let questions = repo
        .list_questions(None, filter)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect::<Vec<_>>();

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

    Ok(Json(PublicQuestion::from(question)))
}

/// Grades an answer and records it.
///
/// * Only player accounts may submit.
/// * Every attempt is appended to the score ledger and its points added to
///   the player's total in the same write.
/// * The explanation is revealed only for correct answers.
pub async fn submit_answer(
    State(repo): State<Repo>,
    principal: Principal,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<SubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_player()?;

    let question = repo
        .question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let verdict = grade(&question, &payload);
    let time_taken = payload.time_taken.unwrap_or(0);

    let (record, total_points) = repo
        .record_submission(NewScore {
            user_id: principal.user_id,
            question_id: question.id,
            points_awarded: verdict.points_awarded,
            time_taken,
            is_correct: verdict.is_correct,
            submitted_answer: NewScore::raw_answer(&payload),
        })
        .await?;

    tracing::info!(
        user_id = principal.user_id,
        question_id = question.id,
        score_id = record.id,
        correct = verdict.is_correct,
        points = verdict.points_awarded,
        "Answer graded"
    );

    Ok(Json(SubmissionResponse {
        correct: verdict.is_correct,
        points_awarded: verdict.points_awarded,
        time_taken,
        total_points,
        explanation: verdict.is_correct.then_some(question.explanation),
    }))
}
