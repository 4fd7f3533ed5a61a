use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::validation::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// One training session as actually performed, tied to the position the
/// user held when it started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_program_state_id: Uuid,
    pub week_number: i32,
    pub day_index: i32,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// One logged set. `reps_performed` against `target_reps` is what the
/// progression engine judges success and failure on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub prescription_id: Uuid,
    pub lift_id: Uuid,
    pub set_number: i32,
    pub weight: f64,
    pub target_reps: i32,
    pub reps_performed: i32,
    pub is_amrap: bool,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSetRecord {
    pub prescription_id: Uuid,
    pub lift_id: Uuid,
    pub set_number: i32,
    pub weight: f64,
    pub target_reps: i32,
    pub reps_performed: i32,
    #[serde(default)]
    pub is_amrap: bool,
}

impl CreateSetRecord {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.set_number < 1 {
            report.error("set_number", "set number must be at least 1");
        }
        if self.weight < 0.0 {
            report.error("weight", "weight must be nonnegative");
        }
        if self.target_reps < 0 {
            report.error("target_reps", "target reps must be nonnegative");
        }
        if self.reps_performed < 0 {
            report.error("reps_performed", "performed reps must be nonnegative");
        }
        report
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Omitted fields fall back to the user's current position.
    pub week_number: Option<i32>,
    pub day_index: Option<i32>,
}
