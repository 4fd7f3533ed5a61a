use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{CreateWeek, ValidationReport, Week, WeekDay, Weekday};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn weeks_routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_week))
        .route("/:week_id", get(get_week).put(update_week).delete(delete_week))
        .route("/:week_id/days", get(get_week_days).put(set_week_days))
}

#[derive(Debug, Deserialize)]
pub struct WeekDayEntry {
    pub day_id: Uuid,
    pub day_of_week: Weekday,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWeekRequest {
    pub variant: Option<crate::models::WeekVariant>,
}

pub async fn get_week(
    State(state): State<AppState>,
    Path(week_id): Path<Uuid>,
) -> Result<Json<Week>, ApiError> {
    state
        .repos
        .weeks
        .get(week_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("week not found"))
}

pub async fn create_week(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateWeek>,
) -> Result<(StatusCode, Json<Week>), ApiError> {
    identity.require_admin()?;

    let mut report = request.validate();
    let cycle = state.repos.cycles.get(request.cycle_id).await?;
    match &cycle {
        None => return Err(ApiError::not_found("cycle not found")),
        Some(cycle) => {
            // Week numbers stay dense 1..length within the cycle.
            if request.week_number > cycle.length_weeks {
                report.error(
                    "week_number",
                    &format!("cycle is only {} weeks long", cycle.length_weeks),
                );
            }
            let existing = state.repos.weeks.list_for_cycle(cycle.id).await?;
            if existing.iter().any(|w| w.week_number == request.week_number) {
                report.error("week_number", "week number already exists in this cycle");
            }
        }
    }
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let week = state
        .repos
        .weeks
        .create(Week {
            id: Uuid::new_v4(),
            cycle_id: request.cycle_id,
            week_number: request.week_number,
            variant: request.variant,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(week)))
}

pub async fn update_week(
    State(state): State<AppState>,
    identity: Identity,
    Path(week_id): Path<Uuid>,
    Json(request): Json<UpdateWeekRequest>,
) -> Result<Json<Week>, ApiError> {
    identity.require_admin()?;

    let mut week = state
        .repos
        .weeks
        .get(week_id)
        .await?
        .ok_or_else(|| ApiError::not_found("week not found"))?;
    week.variant = request.variant;

    state
        .repos
        .weeks
        .update(week)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("week not found"))
}

pub async fn delete_week(
    State(state): State<AppState>,
    identity: Identity,
    Path(week_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.weeks.delete(week_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("week not found"))
    }
}

pub async fn get_week_days(
    State(state): State<AppState>,
    Path(week_id): Path<Uuid>,
) -> Result<Json<Vec<WeekDay>>, ApiError> {
    if state.repos.weeks.get(week_id).await?.is_none() {
        return Err(ApiError::not_found("week not found"));
    }
    Ok(Json(state.repos.weeks.days_for(week_id).await?))
}

/// Replace a week's day list. List order becomes the authoritative
/// position; the weekday labels are display hints.
pub async fn set_week_days(
    State(state): State<AppState>,
    identity: Identity,
    Path(week_id): Path<Uuid>,
    Json(entries): Json<Vec<WeekDayEntry>>,
) -> Result<Json<Vec<WeekDay>>, ApiError> {
    identity.require_admin()?;

    if state.repos.weeks.get(week_id).await?.is_none() {
        return Err(ApiError::not_found("week not found"));
    }

    let mut report = ValidationReport::new();
    for (i, entry) in entries.iter().enumerate() {
        if state.repos.days.get(entry.day_id).await?.is_none() {
            report.error(&format!("entries[{i}].day_id"), "day not found");
        }
    }
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let rows: Vec<WeekDay> = entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| WeekDay {
            week_id,
            day_id: entry.day_id,
            day_of_week: entry.day_of_week,
            position: position as i32,
        })
        .collect();
    state.repos.weeks.set_days(week_id, rows).await?;
    Ok(Json(state.repos.weeks.days_for(week_id).await?))
}
