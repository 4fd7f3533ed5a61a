use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    CreateProgram, CreateProgramProgression, Program, ProgramProgression, UpdateProgram,
    UpdateProgramProgression,
};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn programs_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_programs).post(create_program))
        .route(
            "/:program_id",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route(
            "/:program_id/progressions",
            get(list_program_progressions).post(link_progression),
        )
        .route(
            "/:program_id/progressions/:link_id",
            axum::routing::put(update_progression_link).delete(unlink_progression),
        )
}

pub async fn list_programs(State(state): State<AppState>) -> Result<Json<Vec<Program>>, ApiError> {
    Ok(Json(state.repos.programs.list().await?))
}

pub async fn get_program(
    State(state): State<AppState>,
    Path(program_id): Path<Uuid>,
) -> Result<Json<Program>, ApiError> {
    state
        .repos
        .programs
        .get(program_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("program not found"))
}

pub async fn create_program(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateProgram>,
) -> Result<(StatusCode, Json<Program>), ApiError> {
    identity.require_admin()?;

    let mut report = request.validate();
    let slug = request.resolved_slug();
    if report.valid() && state.repos.programs.get_by_slug(&slug).await?.is_some() {
        report.error("slug", "slug is already in use");
    }
    if state.repos.cycles.get(request.cycle_id).await?.is_none() {
        report.error("cycle_id", "cycle not found");
    }
    if let Some(id) = request.weekly_lookup_id {
        if state.repos.lookups.get_weekly(id).await?.is_none() {
            report.error("weekly_lookup_id", "weekly lookup not found");
        }
    }
    if let Some(id) = request.daily_lookup_id {
        if state.repos.lookups.get_daily(id).await?.is_none() {
            report.error("daily_lookup_id", "daily lookup not found");
        }
    }
    if let Some(id) = request.rotation_lookup_id {
        if state.repos.lookups.get_rotation(id).await?.is_none() {
            report.error("rotation_lookup_id", "rotation lookup not found");
        }
    }
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let now = Utc::now();
    let program = state
        .repos
        .programs
        .create(Program {
            id: Uuid::new_v4(),
            name: request.name,
            slug,
            description: request.description,
            cycle_id: request.cycle_id,
            weekly_lookup_id: request.weekly_lookup_id,
            daily_lookup_id: request.daily_lookup_id,
            rotation_lookup_id: request.rotation_lookup_id,
            default_rounding: request.default_rounding.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(program)))
}

pub async fn update_program(
    State(state): State<AppState>,
    identity: Identity,
    Path(program_id): Path<Uuid>,
    Json(request): Json<UpdateProgram>,
) -> Result<Json<Program>, ApiError> {
    identity.require_admin()?;

    let mut program = state
        .repos
        .programs
        .get(program_id)
        .await?
        .ok_or_else(|| ApiError::not_found("program not found"))?;

    if let Some(name) = request.name {
        program.name = name;
    }
    if request.description.is_some() {
        program.description = request.description;
    }
    if let Some(cycle_id) = request.cycle_id {
        if state.repos.cycles.get(cycle_id).await?.is_none() {
            return Err(ApiError::not_found("cycle not found"));
        }
        program.cycle_id = cycle_id;
    }
    if request.weekly_lookup_id.is_some() {
        program.weekly_lookup_id = request.weekly_lookup_id;
    }
    if request.daily_lookup_id.is_some() {
        program.daily_lookup_id = request.daily_lookup_id;
    }
    if request.rotation_lookup_id.is_some() {
        program.rotation_lookup_id = request.rotation_lookup_id;
    }
    if let Some(rounding) = request.default_rounding {
        program.default_rounding = rounding;
    }
    program.updated_at = Utc::now();

    state
        .repos
        .programs
        .update(program)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("program not found"))
}

pub async fn delete_program(
    State(state): State<AppState>,
    identity: Identity,
    Path(program_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.programs.delete(program_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("program not found"))
    }
}

pub async fn list_program_progressions(
    State(state): State<AppState>,
    Path(program_id): Path<Uuid>,
) -> Result<Json<Vec<ProgramProgression>>, ApiError> {
    if state.repos.programs.get(program_id).await?.is_none() {
        return Err(ApiError::not_found("program not found"));
    }
    Ok(Json(
        state
            .repos
            .program_progressions
            .list_for_program(program_id)
            .await?,
    ))
}

pub async fn link_progression(
    State(state): State<AppState>,
    identity: Identity,
    Path(program_id): Path<Uuid>,
    Json(request): Json<CreateProgramProgression>,
) -> Result<(StatusCode, Json<ProgramProgression>), ApiError> {
    identity.require_admin()?;

    if state.repos.programs.get(program_id).await?.is_none() {
        return Err(ApiError::not_found("program not found"));
    }
    if state
        .repos
        .progressions
        .get(request.progression_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("progression not found"));
    }
    if state.repos.lifts.get(request.lift_id).await?.is_none() {
        return Err(ApiError::not_found("lift not found"));
    }

    let link = state
        .repos
        .program_progressions
        .link(ProgramProgression {
            id: Uuid::new_v4(),
            program_id,
            progression_id: request.progression_id,
            lift_id: request.lift_id,
            priority: request.priority.unwrap_or(0),
            enabled: request.enabled.unwrap_or(true),
            created_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn update_progression_link(
    State(state): State<AppState>,
    identity: Identity,
    Path((program_id, link_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateProgramProgression>,
) -> Result<Json<ProgramProgression>, ApiError> {
    identity.require_admin()?;

    let mut link = state
        .repos
        .program_progressions
        .get(link_id)
        .await?
        .filter(|l| l.program_id == program_id)
        .ok_or_else(|| ApiError::not_found("program progression not found"))?;

    if let Some(priority) = request.priority {
        link.priority = priority;
    }
    if let Some(enabled) = request.enabled {
        link.enabled = enabled;
    }

    state
        .repos
        .program_progressions
        .update(link)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("program progression not found"))
}

pub async fn unlink_progression(
    State(state): State<AppState>,
    identity: Identity,
    Path((program_id, link_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;

    let exists = state
        .repos
        .program_progressions
        .get(link_id)
        .await?
        .filter(|l| l.program_id == program_id)
        .is_some();
    if !exists {
        return Err(ApiError::not_found("program progression not found"));
    }
    state.repos.program_progressions.unlink(link_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
