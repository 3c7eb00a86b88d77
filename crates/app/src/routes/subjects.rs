use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use study_core::{
    model::{Subject, SubjectDraft, SubjectId, SubjectPatch},
    progress::{SubjectOverview, SubjectProgress},
};

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

pub async fn list_subjects_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Subject>>, ApiError> {
    Ok(Json(state.services.subjects().list(&user).await?))
}

pub async fn create_subject_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<SubjectDraft>,
) -> Result<(StatusCode, Json<Subject>), ApiError> {
    let subject = state.services.subjects().create(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn overview_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SubjectOverview>, ApiError> {
    Ok(Json(state.services.subjects().overview(&user).await?))
}

pub async fn update_subject_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(patch): Json<SubjectPatch>,
) -> Result<Json<Subject>, ApiError> {
    let subject = state
        .services
        .subjects()
        .update(&user, SubjectId::new(id), patch)
        .await?;
    Ok(Json(subject))
}

pub async fn delete_subject_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .subjects()
        .delete(&user, SubjectId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn progress_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<SubjectProgress>, ApiError> {
    state
        .services
        .subjects()
        .progress(&user, SubjectId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("subject not found or access denied".into()))
}
