use axum::{Json, extract::State, http::StatusCode};
use study_core::model::{Profile, ProfileDraft, ProfilePatch};

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

/// Responds with `null` until the caller has created a profile.
pub async fn get_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Option<Profile>>, ApiError> {
    Ok(Json(state.services.profiles().current(&user).await?))
}

pub async fn create_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<ProfileDraft>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let profile = state.services.profiles().create(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.services.profiles().update(&user, patch).await?))
}
