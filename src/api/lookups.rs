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
    CreateDailyLookup, CreateRotationLookup, CreateWeeklyLookup, DailyLookup, RotationLookup,
    WeeklyLookup,
};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn weekly_lookups_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_weekly).post(create_weekly))
        .route("/:lookup_id", get(get_weekly).put(update_weekly).delete(delete_weekly))
}

pub fn daily_lookups_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_daily).post(create_daily))
        .route("/:lookup_id", get(get_daily).put(update_daily).delete(delete_daily))
}

pub fn rotation_lookups_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rotation).post(create_rotation))
        .route(
            "/:lookup_id",
            get(get_rotation).put(update_rotation).delete(delete_rotation),
        )
}

// Weekly --------------------------------------------------------------------

pub async fn list_weekly(State(state): State<AppState>) -> Result<Json<Vec<WeeklyLookup>>, ApiError> {
    Ok(Json(state.repos.lookups.list_weekly().await?))
}

pub async fn get_weekly(
    State(state): State<AppState>,
    Path(lookup_id): Path<Uuid>,
) -> Result<Json<WeeklyLookup>, ApiError> {
    state
        .repos
        .lookups
        .get_weekly(lookup_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("weekly lookup not found"))
}

pub async fn create_weekly(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateWeeklyLookup>,
) -> Result<(StatusCode, Json<WeeklyLookup>), ApiError> {
    identity.require_admin()?;
    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    let now = Utc::now();
    let lookup = state
        .repos
        .lookups
        .create_weekly(WeeklyLookup {
            id: Uuid::new_v4(),
            name: request.name,
            entries: request.entries,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lookup)))
}

pub async fn update_weekly(
    State(state): State<AppState>,
    identity: Identity,
    Path(lookup_id): Path<Uuid>,
    Json(request): Json<CreateWeeklyLookup>,
) -> Result<Json<WeeklyLookup>, ApiError> {
    identity.require_admin()?;
    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    let existing = state
        .repos
        .lookups
        .get_weekly(lookup_id)
        .await?
        .ok_or_else(|| ApiError::not_found("weekly lookup not found"))?;
    state
        .repos
        .lookups
        .update_weekly(WeeklyLookup {
            id: lookup_id,
            name: request.name,
            entries: request.entries,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("weekly lookup not found"))
}

pub async fn delete_weekly(
    State(state): State<AppState>,
    identity: Identity,
    Path(lookup_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.lookups.delete_weekly(lookup_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("weekly lookup not found"))
    }
}

// Daily ---------------------------------------------------------------------

pub async fn list_daily(State(state): State<AppState>) -> Result<Json<Vec<DailyLookup>>, ApiError> {
    Ok(Json(state.repos.lookups.list_daily().await?))
}

pub async fn get_daily(
    State(state): State<AppState>,
    Path(lookup_id): Path<Uuid>,
) -> Result<Json<DailyLookup>, ApiError> {
    state
        .repos
        .lookups
        .get_daily(lookup_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("daily lookup not found"))
}

pub async fn create_daily(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateDailyLookup>,
) -> Result<(StatusCode, Json<DailyLookup>), ApiError> {
    identity.require_admin()?;
    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    let now = Utc::now();
    let lookup = state
        .repos
        .lookups
        .create_daily(DailyLookup {
            id: Uuid::new_v4(),
            name: request.name,
            entries: request.entries,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lookup)))
}

pub async fn update_daily(
    State(state): State<AppState>,
    identity: Identity,
    Path(lookup_id): Path<Uuid>,
    Json(request): Json<CreateDailyLookup>,
) -> Result<Json<DailyLookup>, ApiError> {
    identity.require_admin()?;
    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    let existing = state
        .repos
        .lookups
        .get_daily(lookup_id)
        .await?
        .ok_or_else(|| ApiError::not_found("daily lookup not found"))?;
    state
        .repos
        .lookups
        .update_daily(DailyLookup {
            id: lookup_id,
            name: request.name,
            entries: request.entries,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("daily lookup not found"))
}

pub async fn delete_daily(
    State(state): State<AppState>,
    identity: Identity,
    Path(lookup_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.lookups.delete_daily(lookup_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("daily lookup not found"))
    }
}

// Rotation ------------------------------------------------------------------

pub async fn list_rotation(
    State(state): State<AppState>,
) -> Result<Json<Vec<RotationLookup>>, ApiError> {
    Ok(Json(state.repos.lookups.list_rotation().await?))
}

pub async fn get_rotation(
    State(state): State<AppState>,
    Path(lookup_id): Path<Uuid>,
) -> Result<Json<RotationLookup>, ApiError> {
    state
        .repos
        .lookups
        .get_rotation(lookup_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("rotation lookup not found"))
}

pub async fn create_rotation(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateRotationLookup>,
) -> Result<(StatusCode, Json<RotationLookup>), ApiError> {
    identity.require_admin()?;
    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    let now = Utc::now();
    let lookup = state
        .repos
        .lookups
        .create_rotation(RotationLookup {
            id: Uuid::new_v4(),
            name: request.name,
            entries: request.entries,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lookup)))
}

pub async fn update_rotation(
    State(state): State<AppState>,
    identity: Identity,
    Path(lookup_id): Path<Uuid>,
    Json(request): Json<CreateRotationLookup>,
) -> Result<Json<RotationLookup>, ApiError> {
    identity.require_admin()?;
    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    let existing = state
        .repos
        .lookups
        .get_rotation(lookup_id)
        .await?
        .ok_or_else(|| ApiError::not_found("rotation lookup not found"))?;
    state
        .repos
        .lookups
        .update_rotation(RotationLookup {
            id: lookup_id,
            name: request.name,
            entries: request.entries,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("rotation lookup not found"))
}

pub async fn delete_rotation(
    State(state): State<AppState>,
    identity: Identity,
    Path(lookup_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.lookups.delete_rotation(lookup_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("rotation lookup not found"))
    }
}
