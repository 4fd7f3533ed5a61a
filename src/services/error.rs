use thiserror::Error;

use crate::engine::EngineError;
use crate::models::ValidationReport;

/// Service-level failure, mapped onto HTTP statuses at the API boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Field-level problems; the operation was not performed.
    #[error("validation failed")]
    Validation(ValidationReport),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// The operation is well-formed but the current state forbids it.
    #[error("{0}")]
    Precondition(String),

    /// Concurrent modification; the caller should retry.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn validation(report: ValidationReport) -> Self {
        Self::Validation(report)
    }

    /// Single-field shorthand for ad hoc checks.
    pub fn invalid(field: &str, message: &str) -> Self {
        let mut report = ValidationReport::new();
        report.error(field, message);
        Self::Validation(report)
    }
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MaxNotFound { lift_id, max_type } => ServiceError::NotFound {
                resource: "current max",
                id: format!("{max_type} for lift {lift_id}"),
            },
            EngineError::LiftNotFound { lift_id } => ServiceError::not_found("lift", lift_id),
            EngineError::EntryNotFound { reps, rpe } => ServiceError::NotFound {
                resource: "rpe chart entry",
                id: format!("{reps} reps at rpe {rpe}"),
            },
            other => ServiceError::Precondition(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
