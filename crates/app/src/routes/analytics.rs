use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use study_core::analytics::StudyAnalytics;

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    days: Option<u32>,
    /// Minutes east of UTC used to group sessions into days.
    tz_offset_minutes: Option<i32>,
}

pub async fn analytics_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<StudyAnalytics>, ApiError> {
    let analytics = state
        .services
        .analytics()
        .study_analytics(&user, query.days, query.tz_offset_minutes)
        .await?;
    Ok(Json(analytics))
}
