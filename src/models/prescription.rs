use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::lift_max::MaxType;
use super::validation::ValidationReport;

/// Rounding direction for computed loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingDirection {
    Nearest,
    Up,
    Down,
}

impl RoundingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingDirection::Nearest => "nearest",
            RoundingDirection::Up => "up",
            RoundingDirection::Down => "down",
        }
    }
}

impl fmt::Display for RoundingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(RoundingDirection::Nearest),
            "up" => Ok(RoundingDirection::Up),
            "down" => Ok(RoundingDirection::Down),
            other => Err(format!("unknown rounding direction: {other}")),
        }
    }
}

/// Barbell rounding policy: a plate increment and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rounding {
    pub increment: f64,
    pub direction: RoundingDirection,
}

impl Default for Rounding {
    fn default() -> Self {
        Self {
            increment: 5.0,
            direction: RoundingDirection::Nearest,
        }
    }
}

/// Which periodization lookups a percent-of-max strategy consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKey {
    Week,
    Day,
    #[default]
    Both,
    None,
}

impl LookupKey {
    pub fn uses_weekly(&self) -> bool {
        matches!(self, LookupKey::Week | LookupKey::Both)
    }

    pub fn uses_daily(&self) -> bool {
        matches!(self, LookupKey::Day | LookupKey::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKey::Week => "week",
            LookupKey::Day => "day",
            LookupKey::Both => "both",
            LookupKey::None => "none",
        }
    }
}

impl FromStr for LookupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(LookupKey::Week),
            "day" => Ok(LookupKey::Day),
            "both" => Ok(LookupKey::Both),
            "none" => Ok(LookupKey::None),
            other => Err(format!("unknown lookup key: {other}")),
        }
    }
}

/// How the working weight for a prescription is computed. Dispatch is on the
/// tag; persistence stores the tag plus flattened parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Percentage of the user's current max of `reference` type.
    PercentOf {
        reference: MaxType,
        percentage: f64,
        #[serde(default)]
        rounding: Rounding,
        #[serde(default)]
        lookup_key: LookupKey,
    },
    /// A literal weight, e.g. an empty-bar or fixed-implement movement.
    FixedWeight {
        weight: f64,
        #[serde(default)]
        rounding: Rounding,
    },
    /// Derived from another prescription's top work set in the same workout.
    Computed {
        source_prescription_id: Uuid,
        percentage: f64,
        #[serde(default)]
        rounding: Rounding,
    },
}

impl LoadStrategy {
    pub fn rounding(&self) -> Rounding {
        match self {
            LoadStrategy::PercentOf { rounding, .. }
            | LoadStrategy::FixedWeight { rounding, .. }
            | LoadStrategy::Computed { rounding, .. } => *rounding,
        }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        match self {
            LoadStrategy::PercentOf { percentage, rounding, .. } => {
                if *percentage <= 0.0 {
                    report.error("load_strategy.percentage", "percentage must be positive");
                }
                if rounding.increment <= 0.0 {
                    report.error("load_strategy.rounding", "rounding increment must be positive");
                }
            }
            LoadStrategy::FixedWeight { weight, rounding } => {
                if *weight < 0.0 {
                    report.error("load_strategy.weight", "weight must be nonnegative");
                }
                if rounding.increment <= 0.0 {
                    report.error("load_strategy.rounding", "rounding increment must be positive");
                }
            }
            LoadStrategy::Computed { percentage, rounding, .. } => {
                if *percentage <= 0.0 {
                    report.error("load_strategy.percentage", "percentage must be positive");
                }
                if rounding.increment <= 0.0 {
                    report.error("load_strategy.rounding", "rounding increment must be positive");
                }
            }
        }
        report
    }
}

/// One step of a ramp scheme. A step without an explicit percentage takes its
/// percentage from the weekly lookup's per-set table at resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampStep {
    pub percentage: Option<f64>,
    pub reps: Option<i32>,
    #[serde(default)]
    pub is_amrap: bool,
}

/// One stage of a stage scheme (e.g. GZCL tier cycling).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub name: String,
    pub sets: u32,
    pub reps: i32,
    #[serde(default)]
    pub is_amrap: bool,
    /// Total reps that must be reached across the stage's sets to hold it.
    pub min_volume: i32,
}

/// How one prescription expands into a list of sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetScheme {
    /// N identical sets; the AMRAP flag rides on the last set.
    Fixed {
        sets: u32,
        reps: i32,
        #[serde(default)]
        is_amrap: bool,
    },
    /// One set per step, ramping to a top set.
    Ramp {
        steps: Vec<RampStep>,
        /// A step is a work set when its percentage meets this threshold.
        work_set_threshold: f64,
    },
    /// Every set is max reps.
    Amrap { sets: u32, reps: i32 },
    /// Only the current stage renders; progression moves the stage index.
    Stage { stages: Vec<StageDef> },
}

impl SetScheme {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        match self {
            SetScheme::Fixed { sets, reps, .. } | SetScheme::Amrap { sets, reps } => {
                if *sets == 0 {
                    report.error("set_scheme.sets", "set count must be at least 1");
                }
                if *reps <= 0 {
                    report.error("set_scheme.reps", "rep count must be positive");
                }
            }
            SetScheme::Ramp { steps, work_set_threshold } => {
                if steps.is_empty() {
                    report.error("set_scheme.steps", "a ramp needs at least one step");
                }
                if *work_set_threshold < 0.0 {
                    report.error("set_scheme.work_set_threshold", "threshold must be nonnegative");
                }
                for (i, step) in steps.iter().enumerate() {
                    if let Some(pct) = step.percentage {
                        if pct <= 0.0 {
                            report.error(
                                &format!("set_scheme.steps[{i}].percentage"),
                                "step percentage must be positive",
                            );
                        }
                    }
                }
            }
            SetScheme::Stage { stages } => {
                if stages.is_empty() {
                    report.error("set_scheme.stages", "a stage scheme needs at least one stage");
                }
                for (i, stage) in stages.iter().enumerate() {
                    if stage.sets == 0 {
                        report.error(&format!("set_scheme.stages[{i}].sets"), "set count must be at least 1");
                    }
                    if stage.reps <= 0 {
                        report.error(&format!("set_scheme.stages[{i}].reps"), "rep count must be positive");
                    }
                    if stage.min_volume < 0 {
                        report.error(
                            &format!("set_scheme.stages[{i}].min_volume"),
                            "minimum volume must be nonnegative",
                        );
                    }
                }
            }
        }
        report
    }
}

/// Abstract recipe for one exercise within a day: a lift, a way to compute
/// weight, a way to expand into sets, and ordering metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub lift_id: Uuid,
    pub load_strategy: LoadStrategy,
    pub set_scheme: SetScheme,
    pub order: i32,
    pub notes: Option<String>,
    pub rest_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrescription {
    pub lift_id: Uuid,
    pub load_strategy: LoadStrategy,
    pub set_scheme: SetScheme,
    pub order: Option<i32>,
    pub notes: Option<String>,
    pub rest_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePrescription {
    pub load_strategy: Option<LoadStrategy>,
    pub set_scheme: Option<SetScheme>,
    pub order: Option<i32>,
    pub notes: Option<String>,
    pub rest_seconds: Option<i32>,
}

impl CreatePrescription {
    pub fn validate(&self) -> ValidationReport {
        let mut report = self.load_strategy.validate();
        report.merge(self.set_scheme.validate());
        if let Some(rest) = self.rest_seconds {
            if rest < 0 {
                report.error("rest_seconds", "rest must be nonnegative");
            }
        }
        report
    }
}
