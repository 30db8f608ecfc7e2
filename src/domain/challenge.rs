// src/domain/challenge.rs

//! Challenge lifecycle: PENDING -> ACTIVE -> COMPLETED, with CANCELLED
//! reachable from either open state.

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::challenge::{Challenge, ChallengeStatus, ChallengeUpdate},
};

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeStatus::Completed | ChallengeStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: ChallengeStatus) -> bool {
        use crate::models::challenge::ChallengeStatus::*;
        matches!(
            (*self, next),
            (Pending, Active) | (Pending, Cancelled) | (Active, Completed) | (Active, Cancelled)
        )
    }
}

/// Validates a requested transition and computes the columns to write.
///
/// A winner is only accepted when completing, and must be a participant.
pub fn plan_transition(
    challenge: &Challenge,
    next: ChallengeStatus,
    winner: Option<i64>,
    now: DateTime<Utc>,
) -> Result<ChallengeUpdate, AppError> {
    if !challenge.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Cannot move challenge from {:?} to {:?}",
            challenge.status, next
        )));
    }

    if let Some(winner_id) = winner {
        if next != ChallengeStatus::Completed {
            return Err(AppError::BadRequest(
                "A winner can only be set when completing a challenge".to_string(),
            ));
        }
        if !challenge.involves(winner_id) {
            return Err(AppError::BadRequest(
                "Winner must be one of the participants".to_string(),
            ));
        }
    }

    let started_at = if next == ChallengeStatus::Active {
        Some(now)
    } else {
        challenge.started_at
    };
    let completed_at = if next.is_terminal() {
        Some(now)
    } else {
        challenge.completed_at
    };

    Ok(ChallengeUpdate {
        from: challenge.status,
        status: next,
        winner_id: winner,
        started_at,
        completed_at,
    })
}
