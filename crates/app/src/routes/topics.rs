use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use study_core::model::{SubjectId, Topic, TopicDraft, TopicId, TopicProgressPatch};

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

/// Topics under a subject. Empty for subjects the caller does not own.
pub async fn list_topics_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(subject_id): Path<u64>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    let topics = state
        .services
        .topics()
        .list_by_subject(&user, SubjectId::new(subject_id))
        .await?;
    Ok(Json(topics))
}

pub async fn create_topic_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(subject_id): Path<u64>,
    Json(draft): Json<TopicDraft>,
) -> Result<(StatusCode, Json<Topic>), ApiError> {
    let topic = state
        .services
        .topics()
        .create(&user, SubjectId::new(subject_id), draft)
        .await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub async fn update_progress_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(patch): Json<TopicProgressPatch>,
) -> Result<Json<Topic>, ApiError> {
    let topic = state
        .services
        .topics()
        .update_progress(&user, TopicId::new(id), patch)
        .await?;
    Ok(Json(topic))
}

pub async fn delete_topic_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.services.topics().delete(&user, TopicId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
