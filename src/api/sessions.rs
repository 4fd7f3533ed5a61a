use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CreateSetRecord, SetRecord, StartSessionRequest, WorkoutSession};
use crate::services::ProgressionReport;

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/:session_id", get(get_session))
        .route("/:session_id/sets", post(log_set))
        .route("/:session_id/complete", post(complete_session))
        .route("/:session_id/abandon", post(abandon_session))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub sets: Vec<SetRecord>,
}

#[derive(Debug, Serialize)]
pub struct LoggedSetResponse {
    pub set: SetRecord,
    pub progression_reports: Vec<ProgressionReport>,
}

#[derive(Debug, Serialize)]
pub struct CompletedSessionResponse {
    pub session: WorkoutSession,
    pub progression_reports: Vec<ProgressionReport>,
}

pub async fn start_session(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<WorkoutSession>), ApiError> {
    let user_id = identity.require_user()?;
    let session = state.sessions.start(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (session, sets) = state.sessions.get(session_id).await?;
    Ok(Json(SessionResponse { session, sets }))
}

pub async fn log_set(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CreateSetRecord>,
) -> Result<(StatusCode, Json<LoggedSetResponse>), ApiError> {
    let (set, progression_reports) = state.sessions.log_set(session_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(LoggedSetResponse {
            set,
            progression_reports,
        }),
    ))
}

pub async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CompletedSessionResponse>, ApiError> {
    let (session, progression_reports) = state.sessions.complete(session_id).await?;
    Ok(Json(CompletedSessionResponse {
        session,
        progression_reports,
    }))
}

pub async fn abandon_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WorkoutSession>, ApiError> {
    Ok(Json(state.sessions.abandon(session_id).await?))
}
