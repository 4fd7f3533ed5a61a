use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CreateCycle, Cycle, UpdateCycle, ValidationReport, Week};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn cycles_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cycles).post(create_cycle))
        .route("/:cycle_id", get(get_cycle).put(update_cycle).delete(delete_cycle))
}

#[derive(Debug, Serialize)]
pub struct CycleResponse {
    #[serde(flatten)]
    pub cycle: Cycle,
    pub weeks: Vec<Week>,
}

pub async fn list_cycles(State(state): State<AppState>) -> Result<Json<Vec<Cycle>>, ApiError> {
    Ok(Json(state.repos.cycles.list().await?))
}

pub async fn get_cycle(
    State(state): State<AppState>,
    Path(cycle_id): Path<Uuid>,
) -> Result<Json<CycleResponse>, ApiError> {
    let cycle = state
        .repos
        .cycles
        .get(cycle_id)
        .await?
        .ok_or_else(|| ApiError::not_found("cycle not found"))?;
    let weeks = state.repos.weeks.list_for_cycle(cycle_id).await?;
    Ok(Json(CycleResponse { cycle, weeks }))
}

pub async fn create_cycle(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateCycle>,
) -> Result<(StatusCode, Json<Cycle>), ApiError> {
    identity.require_admin()?;

    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let now = Utc::now();
    let cycle = state
        .repos
        .cycles
        .create(Cycle {
            id: Uuid::new_v4(),
            name: request.name,
            length_weeks: request.length_weeks,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

pub async fn update_cycle(
    State(state): State<AppState>,
    identity: Identity,
    Path(cycle_id): Path<Uuid>,
    Json(request): Json<UpdateCycle>,
) -> Result<Json<Cycle>, ApiError> {
    identity.require_admin()?;

    let mut cycle = state
        .repos
        .cycles
        .get(cycle_id)
        .await?
        .ok_or_else(|| ApiError::not_found("cycle not found"))?;

    if let Some(name) = request.name {
        cycle.name = name;
    }
    if let Some(length_weeks) = request.length_weeks {
        let mut report = ValidationReport::new();
        if length_weeks < 1 {
            report.error("length_weeks", "cycle length must be at least one week");
        }
        // Shrinking a cycle below its populated weeks would orphan them.
        let weeks = state.repos.weeks.list_for_cycle(cycle_id).await?;
        if weeks.iter().any(|w| w.week_number > length_weeks) {
            report.error(
                "length_weeks",
                "cycle already has weeks beyond the requested length",
            );
        }
        if !report.valid() {
            return Err(ApiError::bad_request(&report));
        }
        cycle.length_weeks = length_weeks;
    }
    cycle.updated_at = Utc::now();

    state
        .repos
        .cycles
        .update(cycle)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("cycle not found"))
}

pub async fn delete_cycle(
    State(state): State<AppState>,
    identity: Identity,
    Path(cycle_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.cycles.delete(cycle_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("cycle not found"))
    }
}
