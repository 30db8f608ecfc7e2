// src/domain/grader.rs

//! Grading of a single submission. Pure: the caller persists the verdict.

use crate::models::{
    question::{Question, QuestionType},
    score::SubmissionRequest,
};

/// Answers faster than this many seconds earn the speed bonus.
pub const SPEED_BONUS_THRESHOLD_SECS: i32 = 30;

/// Submitted code must be longer than this (trimmed, in characters) to pass.
pub const CODING_MIN_CHARS: usize = 10;

/// Outcome of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    pub points_awarded: i32,
}

/// Grades `submission` against `question`.
///
/// Malformed or missing answers are never an error: they grade as incorrect
/// with zero points.
pub fn grade(question: &Question, submission: &SubmissionRequest) -> Verdict {
    let is_correct = match question.question_type {
        QuestionType::Mcq => mcq_matches(question.correct_option, submission.answer.as_deref()),
        QuestionType::Quick => quick_matches(
            question.correct_answer.as_deref(),
            submission.answer.as_deref(),
        ),
        QuestionType::Coding => coding_passes(
            question.solution_code.as_deref(),
            submission.code.as_deref(),
        ),
    };

    let points_awarded = if is_correct {
        award_points(question.points, submission.time_taken.unwrap_or(0))
    } else {
        0
    };

    Verdict {
        is_correct,
        points_awarded,
    }
}

/// Points for a correct answer: base points, times 1.2 (truncated) when fast.
pub fn award_points(points: i32, time_taken: i32) -> i32 {
    if time_taken < SPEED_BONUS_THRESHOLD_SECS {
        // points * 1.2 without floats
        let boosted = i64::from(points) * 6 / 5;
        i32::try_from(boosted).unwrap_or(i32::MAX)
    } else {
        points
    }
}

fn mcq_matches(correct_option: Option<i32>, answer: Option<&str>) -> bool {
    let (Some(correct), Some(answer)) = (correct_option, answer) else {
        return false;
    };
    match answer.trim().parse::<i64>() {
        Ok(index) => index == i64::from(correct),
        Err(_) => false,
    }
}

fn quick_matches(correct_answer: Option<&str>, answer: Option<&str>) -> bool {
    let expected = correct_answer.unwrap_or_default().trim().to_lowercase();
    let submitted = answer.unwrap_or_default().trim().to_lowercase();
    submitted == expected
}

/// Placeholder until real code execution exists: any non-trivial submission passes.
fn coding_passes(solution_code: Option<&str>, code: Option<&str>) -> bool {
    let solution = solution_code.unwrap_or_default().trim();
    let submitted = code.unwrap_or_default().trim();
    if solution.is_empty() || submitted.is_empty() {
        return false;
    }
    submitted.chars().count() > CODING_MIN_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Difficulty, Language};
    use chrono::Utc;
    use sqlx::types::Json;

    fn question(question_type: QuestionType, points: i32) -> Question {
        Question {
            id: 1,
            title: "Sample".to_string(),
            category_id: 1,
            category_name: "General".to_string(),
            question_type,
            difficulty: Difficulty::Easy,
            language: Language::General,
            question_text: "?".to_string(),
            options: Some(Json(vec!["a".into(), "b".into(), "c".into(), "d".into()])),
            correct_option: Some(2),
            correct_answer: Some("true".to_string()),
            solution_code: Some("def f(): return 1".to_string()),
            explanation: "because".to_string(),
            points,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn answer(answer: &str, time_taken: i32) -> SubmissionRequest {
        SubmissionRequest {
            answer: Some(answer.to_string()),
            time_taken: Some(time_taken),
            ..Default::default()
        }
    }

    #[test]
    fn mcq_correct_index_with_speed_bonus() {
        let q = question(QuestionType::Mcq, 20);
        let verdict = grade(&q, &answer("2", 10));
        assert_eq!(
            verdict,
            Verdict {
                is_correct: true,
                points_awarded: 24
            }
        );
    }

    #[test]
    fn mcq_wrong_or_garbage_answers_are_incorrect() {
        let q = question(QuestionType::Mcq, 10);
        for raw in ["1", "-1", "99", "two", "", "2.0", "9999999999999999999999"] {
            let verdict = grade(&q, &answer(raw, 5));
            assert!(!verdict.is_correct, "{raw:?} should not be accepted");
            assert_eq!(verdict.points_awarded, 0);
        }
    }

    #[test]
    fn mcq_accepts_surrounding_whitespace() {
        let q = question(QuestionType::Mcq, 10);
        assert!(grade(&q, &answer(" 2 ", 40)).is_correct);
    }

    #[test]
    fn mcq_missing_answer_is_incorrect() {
        let q = question(QuestionType::Mcq, 10);
        let verdict = grade(&q, &SubmissionRequest::default());
        assert!(!verdict.is_correct);
    }

    #[test]
    fn quick_is_case_and_whitespace_insensitive() {
        let q = question(QuestionType::Quick, 10);
        assert!(grade(&q, &answer(" TRUE ", 40)).is_correct);
        assert!(grade(&q, &answer("true", 40)).is_correct);
        assert!(!grade(&q, &answer("false", 40)).is_correct);
    }

    #[test]
    fn quick_false_matches_capitalised() {
        let mut q = question(QuestionType::Quick, 10);
        q.correct_answer = Some("false".to_string());
        assert!(grade(&q, &answer("False", 40)).is_correct);
    }

    #[test]
    fn coding_placeholder_needs_more_than_ten_chars() {
        let q = question(QuestionType::Coding, 30);
        let short = SubmissionRequest {
            code: Some("  return 1  ".to_string()),
            time_taken: Some(100),
            ..Default::default()
        };
        let long = SubmissionRequest {
            code: Some("def f():\n    return 1".to_string()),
            time_taken: Some(100),
            ..Default::default()
        };
        assert!(!grade(&q, &short).is_correct);
        assert_eq!(grade(&q, &long).points_awarded, 30);
    }

    #[test]
    fn coding_without_reference_solution_never_passes() {
        let mut q = question(QuestionType::Coding, 30);
        q.solution_code = None;
        let submission = SubmissionRequest {
            code: Some("print('hello world')".to_string()),
            ..Default::default()
        };
        assert!(!grade(&q, &submission).is_correct);
    }

    #[test]
    fn speed_bonus_boundary() {
        assert_eq!(award_points(20, 29), 24);
        assert_eq!(award_points(20, 30), 20);
        assert_eq!(award_points(10, 0), 12);
        // 7 * 1.2 = 8.4, truncated
        assert_eq!(award_points(7, 1), 8);
        assert_eq!(award_points(15, 45), 15);
    }

    #[test]
    fn missing_time_counts_as_fast() {
        let q = question(QuestionType::Mcq, 10);
        let submission = SubmissionRequest {
            answer: Some("2".to_string()),
            ..Default::default()
        };
        assert_eq!(grade(&q, &submission).points_awarded, 12);
    }
}
