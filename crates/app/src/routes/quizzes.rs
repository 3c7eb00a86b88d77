use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use study_core::model::{AttemptSubmission, Quiz, QuizAttempt, QuizDraft, QuizId, SubjectId};

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

pub async fn list_quizzes_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(subject_id): Path<u64>,
) -> Result<Json<Vec<Quiz>>, ApiError> {
    let quizzes = state
        .services
        .quizzes()
        .list_for_subject(&user, SubjectId::new(subject_id))
        .await?;
    Ok(Json(quizzes))
}

pub async fn save_quiz_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(subject_id): Path<u64>,
    Json(draft): Json<QuizDraft>,
) -> Result<(StatusCode, Json<Quiz>), ApiError> {
    let quiz = state
        .services
        .quizzes()
        .save(&user, SubjectId::new(subject_id), draft)
        .await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

pub async fn get_quiz_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Quiz>, ApiError> {
    Ok(Json(state.services.quizzes().get(&user, QuizId::new(id)).await?))
}

/// Grades the submitted answers against the stored quiz.
pub async fn submit_attempt_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(submission): Json<AttemptSubmission>,
) -> Result<(StatusCode, Json<QuizAttempt>), ApiError> {
    let attempt = state
        .services
        .quizzes()
        .submit_attempt(&user, QuizId::new(id), submission)
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

pub async fn list_attempts_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Vec<QuizAttempt>>, ApiError> {
    let attempts = state
        .services
        .quizzes()
        .list_attempts(&user, QuizId::new(id))
        .await?;
    Ok(Json(attempts))
}
