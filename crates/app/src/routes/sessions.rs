use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use services::{EndedSession, SessionStart};
use study_core::model::{SessionActivityPatch, StudySession, StudySessionId};

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

#[derive(Deserialize)]
pub struct RecentQuery {
    limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct EndSession {
    notes: Option<String>,
}

pub async fn start_session_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(start): Json<SessionStart>,
) -> Result<(StatusCode, Json<StudySession>), ApiError> {
    let session = state.services.sessions().start(&user, start).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn active_session_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Option<StudySession>>, ApiError> {
    Ok(Json(state.services.sessions().active(&user).await?))
}

pub async fn recent_sessions_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<StudySession>>, ApiError> {
    let sessions = state.services.sessions().recent(&user, query.limit).await?;
    Ok(Json(sessions))
}

pub async fn update_activity_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(patch): Json<SessionActivityPatch>,
) -> Result<Json<StudySession>, ApiError> {
    let session = state
        .services
        .sessions()
        .update_activity(&user, StudySessionId::new(id), patch)
        .await?;
    Ok(Json(session))
}

pub async fn end_session_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(body): Json<EndSession>,
) -> Result<Json<EndedSession>, ApiError> {
    let ended = state
        .services
        .sessions()
        .end(&user, StudySessionId::new(id), body.notes)
        .await?;
    Ok(Json(ended))
}
