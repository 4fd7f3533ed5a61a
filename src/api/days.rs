use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{CreateDay, Day, DayPrescription, UpdateDay, ValidationReport};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn days_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_days).post(create_day))
        .route("/:day_id", get(get_day).put(update_day).delete(delete_day))
        .route(
            "/:day_id/prescriptions",
            get(get_day_prescriptions).put(set_day_prescriptions),
        )
}

#[derive(Debug, Deserialize)]
pub struct DayPrescriptionEntry {
    pub prescription_id: Uuid,
    pub order: i32,
}

pub async fn list_days(State(state): State<AppState>) -> Result<Json<Vec<Day>>, ApiError> {
    Ok(Json(state.repos.days.list().await?))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(day_id): Path<Uuid>,
) -> Result<Json<Day>, ApiError> {
    state
        .repos
        .days
        .get(day_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("day not found"))
}

pub async fn create_day(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateDay>,
) -> Result<(StatusCode, Json<Day>), ApiError> {
    identity.require_admin()?;

    let mut report = request.validate();
    let slug = request.resolved_slug();
    // Day slugs are unique within their program scope.
    if report.valid()
        && state
            .repos
            .days
            .get_by_slug(request.program_id, &slug)
            .await?
            .is_some()
    {
        report.error("slug", "slug is already in use within this program");
    }
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let now = Utc::now();
    let day = state
        .repos
        .days
        .create(Day {
            id: Uuid::new_v4(),
            name: request.name,
            slug,
            metadata: request.metadata,
            program_id: request.program_id,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(day)))
}

pub async fn update_day(
    State(state): State<AppState>,
    identity: Identity,
    Path(day_id): Path<Uuid>,
    Json(request): Json<UpdateDay>,
) -> Result<Json<Day>, ApiError> {
    identity.require_admin()?;

    let mut day = state
        .repos
        .days
        .get(day_id)
        .await?
        .ok_or_else(|| ApiError::not_found("day not found"))?;

    if let Some(name) = request.name {
        day.name = name;
    }
    if request.metadata.is_some() {
        day.metadata = request.metadata;
    }
    if request.program_id.is_some() {
        day.program_id = request.program_id;
    }
    day.updated_at = Utc::now();

    state
        .repos
        .days
        .update(day)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("day not found"))
}

pub async fn delete_day(
    State(state): State<AppState>,
    identity: Identity,
    Path(day_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.days.delete(day_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("day not found"))
    }
}

pub async fn get_day_prescriptions(
    State(state): State<AppState>,
    Path(day_id): Path<Uuid>,
) -> Result<Json<Vec<DayPrescription>>, ApiError> {
    if state.repos.days.get(day_id).await?.is_none() {
        return Err(ApiError::not_found("day not found"));
    }
    Ok(Json(state.repos.days.prescriptions_for(day_id).await?))
}

/// Replace a day's ordered prescription list. Orders must be distinct;
/// resolution walks them ascending.
pub async fn set_day_prescriptions(
    State(state): State<AppState>,
    identity: Identity,
    Path(day_id): Path<Uuid>,
    Json(entries): Json<Vec<DayPrescriptionEntry>>,
) -> Result<Json<Vec<DayPrescription>>, ApiError> {
    identity.require_admin()?;

    if state.repos.days.get(day_id).await?.is_none() {
        return Err(ApiError::not_found("day not found"));
    }

    let mut report = ValidationReport::new();
    let mut orders: Vec<i32> = entries.iter().map(|e| e.order).collect();
    orders.sort_unstable();
    if orders.windows(2).any(|pair| pair[0] == pair[1]) {
        report.error("entries", "prescription orders must be distinct");
    }
    for (i, entry) in entries.iter().enumerate() {
        if entry.order < 0 {
            report.error(&format!("entries[{i}].order"), "order must be nonnegative");
        }
        if state
            .repos
            .prescriptions
            .get(entry.prescription_id)
            .await?
            .is_none()
        {
            report.error(&format!("entries[{i}].prescription_id"), "prescription not found");
        }
    }
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let rows: Vec<DayPrescription> = entries
        .into_iter()
        .map(|entry| DayPrescription {
            day_id,
            prescription_id: entry.prescription_id,
            order: entry.order,
        })
        .collect();
    state.repos.days.set_prescriptions(day_id, rows).await?;
    Ok(Json(state.repos.days.prescriptions_for(day_id).await?))
}
