use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{CreatePrescription, Prescription, UpdatePrescription};

use super::error::ApiError;
use super::identity::Identity;
use super::AppState;

pub fn prescriptions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_prescriptions).post(create_prescription))
        .route(
            "/:prescription_id",
            get(get_prescription)
                .put(update_prescription)
                .delete(delete_prescription),
        )
}

pub async fn list_prescriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    Ok(Json(state.repos.prescriptions.list().await?))
}

pub async fn get_prescription(
    State(state): State<AppState>,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<Prescription>, ApiError> {
    state
        .repos
        .prescriptions
        .get(prescription_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("prescription not found"))
}

pub async fn create_prescription(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreatePrescription>,
) -> Result<(StatusCode, Json<Prescription>), ApiError> {
    identity.require_admin()?;

    let report = request.validate();
    if !report.valid() {
        return Err(ApiError::bad_request(&report));
    }
    if state.repos.lifts.get(request.lift_id).await?.is_none() {
        return Err(ApiError::not_found("lift not found"));
    }

    let now = Utc::now();
    let prescription = state
        .repos
        .prescriptions
        .create(Prescription {
            id: Uuid::new_v4(),
            lift_id: request.lift_id,
            load_strategy: request.load_strategy,
            set_scheme: request.set_scheme,
            order: request.order.unwrap_or(0),
            notes: request.notes,
            rest_seconds: request.rest_seconds,
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

pub async fn update_prescription(
    State(state): State<AppState>,
    identity: Identity,
    Path(prescription_id): Path<Uuid>,
    Json(request): Json<UpdatePrescription>,
) -> Result<Json<Prescription>, ApiError> {
    identity.require_admin()?;

    let mut prescription = state
        .repos
        .prescriptions
        .get(prescription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("prescription not found"))?;

    if let Some(strategy) = request.load_strategy {
        let report = strategy.validate();
        if !report.valid() {
            return Err(ApiError::bad_request(&report));
        }
        prescription.load_strategy = strategy;
    }
    if let Some(scheme) = request.set_scheme {
        let report = scheme.validate();
        if !report.valid() {
            return Err(ApiError::bad_request(&report));
        }
        prescription.set_scheme = scheme;
    }
    if let Some(order) = request.order {
        prescription.order = order;
    }
    if request.notes.is_some() {
        prescription.notes = request.notes;
    }
    if request.rest_seconds.is_some() {
        prescription.rest_seconds = request.rest_seconds;
    }
    prescription.updated_at = Utc::now();

    state
        .repos
        .prescriptions
        .update(prescription)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("prescription not found"))
}

pub async fn delete_prescription(
    State(state): State<AppState>,
    identity: Identity,
    Path(prescription_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    if state.repos.prescriptions.delete(prescription_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("prescription not found"))
    }
}
