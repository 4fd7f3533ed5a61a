use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{CreateLift, Lift, UpdateLift};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn lifts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lifts).post(create_lift))
        .route("/:lift_id", get(get_lift).put(update_lift).delete(delete_lift))
}

pub async fn list_lifts(State(state): State<AppState>) -> Result<Json<Vec<Lift>>, ApiError> {
    Ok(Json(state.repos.lifts.list().await?))
}

pub async fn get_lift(
    State(state): State<AppState>,
    Path(lift_id): Path<Uuid>,
) -> Result<Json<Lift>, ApiError> {
    state
        .repos
        .lifts
        .get(lift_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("lift not found"))
}

pub async fn create_lift(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateLift>,
) -> Result<(StatusCode, Json<Lift>), ApiError> {
    identity.require_admin()?;

    let mut report = request.validate();
    let slug = request.resolved_slug();
    if report.valid() && state.repos.lifts.get_by_slug(&slug).await?.is_some() {
        report.error("slug", "slug is already in use");
    }
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    if let Some(parent_id) = request.parent_lift_id {
        if state.repos.lifts.get(parent_id).await?.is_none() {
            return Err(ApiError::not_found("parent lift not found"));
        }
    }

    let now = Utc::now();
    let lift = state
        .repos
        .lifts
        .create(Lift {
            id: Uuid::new_v4(),
            name: request.name,
            slug,
            is_competition_lift: request.is_competition_lift.unwrap_or(false),
            parent_lift_id: request.parent_lift_id,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lift)))
}

pub async fn update_lift(
    State(state): State<AppState>,
    identity: Identity,
    Path(lift_id): Path<Uuid>,
    Json(request): Json<UpdateLift>,
) -> Result<Json<Lift>, ApiError> {
    identity.require_admin()?;

    let mut lift = state
        .repos
        .lifts
        .get(lift_id)
        .await?
        .ok_or_else(|| ApiError::not_found("lift not found"))?;

    if let Some(name) = request.name {
        lift.name = name;
    }
    if let Some(is_competition) = request.is_competition_lift {
        lift.is_competition_lift = is_competition;
    }
    if let Some(parent_id) = request.parent_lift_id {
        if state.repos.lifts.get(parent_id).await?.is_none() {
            return Err(ApiError::not_found("parent lift not found"));
        }
        lift.parent_lift_id = Some(parent_id);
    }
    lift.updated_at = Utc::now();

    state
        .repos
        .lifts
        .update(lift)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("lift not found"))
}

pub async fn delete_lift(
    State(state): State<AppState>,
    identity: Identity,
    Path(lift_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.lifts.delete(lift_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("lift not found"))
    }
}
