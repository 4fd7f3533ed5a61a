use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::engine::progression::factory;
use crate::models::{CreateProgression, Progression, ProgressionState, UpdateProgression};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn progressions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_progressions).post(create_progression))
        .route("/catalog", get(list_catalog))
        .route(
            "/:progression_id",
            get(get_progression)
                .put(update_progression)
                .delete(delete_progression),
        )
}

pub async fn list_progressions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Progression>>, ApiError> {
    Ok(Json(state.repos.progressions.list().await?))
}

/// Names of the stock parameter sets the factory can build.
pub async fn list_catalog() -> Json<Vec<&'static str>> {
    Json(factory::builtin_names().to_vec())
}

pub async fn get_progression(
    State(state): State<AppState>,
    Path(progression_id): Path<Uuid>,
) -> Result<Json<Progression>, ApiError> {
    state
        .repos
        .progressions
        .get(progression_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("progression not found"))
}

pub async fn create_progression(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateProgression>,
) -> Result<(StatusCode, Json<Progression>), ApiError> {
    identity.require_admin()?;

    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }

    let now = Utc::now();
    let progression = state
        .repos
        .progressions
        .create(Progression {
            id: Uuid::new_v4(),
            name: request.name,
            trigger_type: request.trigger_type,
            max_type: request.max_type,
            params: request.params,
            state: ProgressionState::default(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(progression)))
}

pub async fn update_progression(
    State(state): State<AppState>,
    identity: Identity,
    Path(progression_id): Path<Uuid>,
    Json(request): Json<UpdateProgression>,
) -> Result<Json<Progression>, ApiError> {
    identity.require_admin()?;

    let mut progression = state
        .repos
        .progressions
        .get(progression_id)
        .await?
        .ok_or_else(|| ApiError::not_found("progression not found"))?;

    if let Some(name) = request.name {
        progression.name = name;
    }
    if let Some(trigger_type) = request.trigger_type {
        progression.trigger_type = trigger_type;
    }
    if let Some(max_type) = request.max_type {
        progression.max_type = max_type;
    }
    if let Some(params) = request.params {
        let report = crate::engine::progression::validate_params(&params);
        if !report.valid() {
            return Err(ApiError::bad_request(&report));
        }
        progression.params = params;
    }
    progression.updated_at = Utc::now();

    state
        .repos
        .progressions
        .update(progression)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("progression not found"))
}

pub async fn delete_progression(
    State(state): State<AppState>,
    identity: Identity,
    Path(progression_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.progressions.delete(progression_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("progression not found"))
    }
}
