use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::models::ValidationReport;
use crate::services::ServiceError;

/// Wire-level error: a status plus a JSON body. Validation failures carry
/// the full error/warning collections; everything else is a code and a
/// message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error_code": code, "message": message }),
        }
    }

    pub fn bad_request(report: &ValidationReport) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "errors": report.errors, "warnings": report.warnings }),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(report) => ApiError::bad_request(&report),
            ServiceError::NotFound { resource, id } => {
                ApiError::not_found(&format!("{resource} {id} not found"))
            }
            ServiceError::Precondition(message) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "precondition_failed",
                &message,
            ),
            ServiceError::Conflict(message) => {
                ApiError::new(StatusCode::CONFLICT, "conflict", &message)
            }
            ServiceError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error",
                )
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::from(ServiceError::Internal(err))
    }
}
