use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    CreateLiftMax, EnrollRequest, FieldWarning, LiftMax, MaxType, ResolvedWorkout,
    SetMeetDateRequest, UserProgramState,
};
use crate::services::{ProgressionReport, TriggerRequest, WorkoutQuery};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id/lift-maxes", get(max_history).post(record_max))
        .route("/:user_id/program", post(enroll).get(get_state).delete(quit))
        .route("/:user_id/program/meet-date", axum::routing::put(set_meet_date))
        .route("/:user_id/workout", get(get_workout))
        .route("/:user_id/workout/preview", get(preview_workout))
        .route("/:user_id/program-state/advance", post(advance))
        .route("/:user_id/progressions/trigger", post(trigger_progressions))
}

#[derive(Debug, Serialize)]
pub struct MaxResponse {
    pub max: LiftMax,
    pub warnings: Vec<FieldWarning>,
}

#[derive(Debug, Deserialize)]
pub struct MaxHistoryQuery {
    pub lift_id: Option<Uuid>,
    pub max_type: Option<MaxType>,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutParams {
    /// Stamp for the generated workout; defaults to today.
    pub date: Option<NaiveDate>,
    pub week: Option<i32>,
    pub day: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub state: UserProgramState,
    /// Derived schedule figures; never stored.
    pub days_out: Option<i64>,
    pub weeks_to_meet: Option<i64>,
}

impl StateResponse {
    fn new(state: UserProgramState) -> Self {
        let now = Utc::now();
        Self {
            days_out: state.days_out(now),
            weeks_to_meet: state.weeks_to_meet(now),
            state,
        }
    }
}

pub async fn record_max(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Json(request): Json<CreateLiftMax>,
) -> Result<(StatusCode, Json<MaxResponse>), ApiError> {
    identity.authorize_user(user_id)?;
    let recorded = state.maxes.record(user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(MaxResponse {
            max: recorded.max,
            warnings: recorded.warnings,
        }),
    ))
}

pub async fn max_history(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Query(query): Query<MaxHistoryQuery>,
) -> Result<Json<Vec<LiftMax>>, ApiError> {
    identity.authorize_user(user_id)?;
    Ok(Json(
        state
            .maxes
            .history(user_id, query.lift_id, query.max_type)
            .await?,
    ))
}

pub async fn enroll(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Json(request): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<StateResponse>), ApiError> {
    identity.authorize_user(user_id)?;
    let enrolled = state.states.enroll(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(StateResponse::new(enrolled))))
}

pub async fn get_state(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StateResponse>, ApiError> {
    identity.authorize_user(user_id)?;
    Ok(Json(StateResponse::new(state.states.get(user_id).await?)))
}

pub async fn quit(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StateResponse>, ApiError> {
    identity.authorize_user(user_id)?;
    Ok(Json(StateResponse::new(state.states.quit(user_id).await?)))
}

pub async fn set_meet_date(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetMeetDateRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    identity.authorize_user(user_id)?;
    let updated = state
        .states
        .set_meet_date(user_id, request.meet_date)
        .await?;
    Ok(Json(StateResponse::new(updated)))
}

pub async fn get_workout(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Query(params): Query<WorkoutParams>,
) -> Result<Json<ResolvedWorkout>, ApiError> {
    identity.authorize_user(user_id)?;
    let workout = state
        .workouts
        .generate(
            user_id,
            WorkoutQuery {
                date: params.date,
                week: params.week,
                day_slug: params.day,
            },
        )
        .await?;
    Ok(Json(workout))
}

/// Same pipeline as the workout endpoint; exists so clients can look ahead
/// without caring that generation never mutates state either way.
pub async fn preview_workout(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Query(params): Query<WorkoutParams>,
) -> Result<Json<ResolvedWorkout>, ApiError> {
    get_workout(State(state), identity, Path(user_id), Query(params)).await
}

pub async fn advance(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<crate::services::AdvanceResponse>, ApiError> {
    identity.authorize_user(user_id)?;
    Ok(Json(state.states.advance(user_id).await?))
}

pub async fn trigger_progressions(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Json(request): Json<TriggerRequest>,
) -> Result<Json<Vec<ProgressionReport>>, ApiError> {
    identity.authorize_user(user_id)?;
    Ok(Json(state.progressions.trigger(user_id, request).await?))
}
