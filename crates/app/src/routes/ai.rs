//! Tutoring endpoints. Each one renders a prompt and makes a single completion call.

use axum::{Json, extract::State};
use serde::Serialize;
use services::ai::{ChatTurn, ExplainRequest, QuizRequest, StudyPlanRequest, SummarizeRequest};
use study_core::generated_quiz::GeneratedQuiz;

use crate::{auth::CurrentUser, error::ApiError, state::AppState};

#[derive(Serialize)]
pub struct Explanation {
    explanation: String,
}

#[derive(Serialize)]
pub struct ChatReply {
    response: String,
}

#[derive(Serialize)]
pub struct Summary {
    summary: String,
}

#[derive(Serialize)]
pub struct Plan {
    plan: String,
}

pub async fn explain_handler(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<ExplainRequest>,
) -> Result<Json<Explanation>, ApiError> {
    let explanation = state.services.tutor().explain_concept(&request).await?;
    Ok(Json(Explanation { explanation }))
}

/// Falls back to a placeholder question, tagged `fallbackUsed`, when the
/// completion cannot be parsed.
pub async fn quiz_handler(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<QuizRequest>,
) -> Result<Json<GeneratedQuiz>, ApiError> {
    Ok(Json(state.services.tutor().generate_quiz(&request).await?))
}

pub async fn chat_handler(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(turn): Json<ChatTurn>,
) -> Result<Json<ChatReply>, ApiError> {
    let response = state.services.tutor().chat(&turn).await?;
    Ok(Json(ChatReply { response }))
}

pub async fn summarize_handler(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<Summary>, ApiError> {
    let summary = state.services.tutor().summarize(&request).await?;
    Ok(Json(Summary { summary }))
}

pub async fn plan_handler(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<StudyPlanRequest>,
) -> Result<Json<Plan>, ApiError> {
    let plan = state.services.tutor().study_plan(&request).await?;
    Ok(Json(Plan { plan }))
}
