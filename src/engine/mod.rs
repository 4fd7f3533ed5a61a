// Periodization engine: pure computation over borrowed model values.
// All mutable state stays in the repositories; everything here is
// deterministic given its inputs.

pub mod advance;
pub mod generator;
pub mod load;
pub mod lookup;
pub mod max_math;
pub mod progression;
pub mod resolver;
pub mod rounding;
pub mod scheme;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{MaxType, Rounding};

use max_math::RpeChart;

/// Engine-level failure. Resolution is atomic: any of these aborts the
/// whole prescription (and the workout) rather than emitting partial sets.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("weight must be nonnegative")]
    NegativeWeight,

    #[error("rounding increment must be positive")]
    InvalidIncrement,

    #[error("no RPE chart entry for {reps} reps at RPE {rpe}")]
    EntryNotFound { reps: u32, rpe: f64 },

    #[error("no current {max_type} for lift {lift_id}")]
    MaxNotFound { lift_id: Uuid, max_type: MaxType },

    #[error("lift {lift_id} is not loaded")]
    LiftNotFound { lift_id: Uuid },

    #[error("computed load references prescription {prescription_id} which has not resolved yet")]
    UnresolvedSource { prescription_id: Uuid },

    #[error("ramp step {step} has no percentage and the weekly lookup provides none")]
    MissingStepPercentage { step: usize },

    #[error("ramp step {step} has no rep target from its definition or the weekly lookup")]
    MissingStepReps { step: usize },

    #[error("week {week_number} has no training days")]
    EmptyWeek { week_number: i32 },

    #[error("week {week_number} is out of range for a cycle of {length_weeks} weeks")]
    WeekOutOfRange { week_number: i32, length_weeks: i32 },

    #[error("day index {day_index} is out of range for a week of {days} days")]
    DayOutOfRange { day_index: i32, days: usize },

    #[error("progression misconfigured: {0}")]
    Misconfigured(String),
}

/// Injected engine defaults. Built once at startup and shared by reference;
/// nothing in the engine reads process-wide state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Percentage of 1RM a training max defaults to.
    pub training_max_percent: f64,
    /// Rounding applied when nothing more specific is configured.
    pub default_rounding: Rounding,
    /// Finest barbell increment, used when rounding estimated 1RMs.
    pub e1rm_increment: f64,
    pub rpe_chart: RpeChart,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            training_max_percent: 90.0,
            default_rounding: Rounding::default(),
            e1rm_increment: 2.5,
            rpe_chart: RpeChart::standard(),
        }
    }
}
