use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::validation::ValidationReport;

/// The three species of stored max: a true one-rep maximum, a programmable
/// submaximal training max, and an estimated 1RM from a submaximal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxType {
    OneRm,
    TrainingMax,
    E1rm,
}

impl MaxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaxType::OneRm => "one_rm",
            MaxType::TrainingMax => "training_max",
            MaxType::E1rm => "e1rm",
        }
    }
}

impl fmt::Display for MaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_rm" => Ok(MaxType::OneRm),
            "training_max" => Ok(MaxType::TrainingMax),
            "e1rm" => Ok(MaxType::E1rm),
            other => Err(format!("unknown max type: {other}")),
        }
    }
}

/// One historical max row. Rows are append-only; the "current" max for a
/// (user, lift, type) triple is the row with the latest effective date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftMax {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lift_id: Uuid,
    pub max_type: MaxType,
    pub value: f64,
    pub effective_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Parameters for estimating a 1RM from a submaximal set via the RPE chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct E1rmEstimate {
    pub weight: f64,
    pub reps: u32,
    pub rpe: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLiftMax {
    pub lift_id: Uuid,
    pub max_type: MaxType,
    /// Direct value; mutually exclusive with `estimate`.
    pub value: Option<f64>,
    /// RPE-chart estimation input, only meaningful for `e1rm`.
    pub estimate: Option<E1rmEstimate>,
    /// Defaults to today when omitted.
    pub effective_date: Option<NaiveDate>,
}

/// Barbell loads resolve in 0.25 steps, so stored maxes must too.
pub fn is_quarter_precise(value: f64) -> bool {
    (value * 4.0 - (value * 4.0).round()).abs() <= 1e-4
}

impl CreateLiftMax {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        match (&self.value, &self.estimate) {
            (None, None) => report.error("value", "either value or estimate is required"),
            (Some(_), Some(_)) => {
                report.error("value", "value and estimate are mutually exclusive")
            }
            (Some(value), None) => {
                if *value <= 0.0 {
                    report.error("value", "max value must be positive");
                } else if !is_quarter_precise(*value) {
                    report.error("value", "max value must be divisible by 0.25");
                }
            }
            (None, Some(estimate)) => {
                if estimate.weight <= 0.0 {
                    report.error("estimate.weight", "weight must be positive");
                }
                if estimate.reps == 0 {
                    report.error("estimate.reps", "reps must be at least 1");
                }
            }
        }
        report
    }
}
