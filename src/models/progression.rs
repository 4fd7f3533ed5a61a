use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::lift_max::MaxType;
use super::validation::ValidationReport;

/// The event a progression listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    AfterSet,
    AfterSession,
    AfterWeek,
    AfterCycle,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::AfterSet => "after_set",
            TriggerType::AfterSession => "after_session",
            TriggerType::AfterWeek => "after_week",
            TriggerType::AfterCycle => "after_cycle",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "after_set" => Ok(TriggerType::AfterSet),
            "after_session" => Ok(TriggerType::AfterSession),
            "after_week" => Ok(TriggerType::AfterWeek),
            "after_cycle" => Ok(TriggerType::AfterCycle),
            other => Err(format!("unknown trigger type: {other}")),
        }
    }
}

/// Fixed or percentage-based deload size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeloadAmount {
    /// Fraction of the current max, in (0, 1].
    Percent { value: f64 },
    /// Absolute weight subtracted from the current max.
    Fixed { value: f64 },
}

/// Per-stage parameters for a stage progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionStage {
    pub name: String,
    /// Total session reps required to hold this stage.
    pub min_volume: i32,
}

/// Type-specific progression parameters. The tag set is closed; new kinds
/// register a constructor in the engine factory rather than being matched
/// ad hoc elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressionParams {
    /// Unconditional fixed bump on every trigger.
    Linear { increment: f64 },
    /// Linear, but fired once per completed cycle.
    Cycle { increment: f64 },
    /// AMRAP-driven: deload below `min_reps`, single increment up to
    /// `double_threshold`, double increment at or above it.
    GreySkull {
        increment: f64,
        min_reps: i32,
        double_threshold: i32,
        /// Fraction removed on a missed minimum, in (0, 1].
        deload_percent: f64,
    },
    /// Volume-gated stage cycling with reset-and-deload on exhaustion.
    Stage {
        stages: Vec<ProgressionStage>,
        deload_percent: f64,
        #[serde(default)]
        reset_on_exhaustion: bool,
    },
    /// Consecutive-failure counter with a deload once the threshold hits.
    DeloadOnFailure {
        failure_threshold: u32,
        deload: DeloadAmount,
    },
    /// Wave-standard AMRAP surplus bumps plus an end-of-cycle base bump.
    Juggernaut {
        increment: f64,
        cycle_increment: f64,
        /// Weeks per wave; wave index = (week - 1) / wave_length.
        wave_length: i32,
    },
}

impl ProgressionParams {
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressionParams::Linear { .. } => "linear",
            ProgressionParams::Cycle { .. } => "cycle",
            ProgressionParams::GreySkull { .. } => "grey_skull",
            ProgressionParams::Stage { .. } => "stage",
            ProgressionParams::DeloadOnFailure { .. } => "deload_on_failure",
            ProgressionParams::Juggernaut { .. } => "juggernaut",
        }
    }
}

/// Small persistent counters owned by a progression: failure streaks, the
/// live stage index, and the tags of events already applied (bounded so the
/// blob cannot grow without limit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub stage_index: u32,
    #[serde(default)]
    pub processed_events: Vec<Uuid>,
}

/// Redelivered events must be no-ops, so each application records its tag.
const PROCESSED_EVENT_WINDOW: usize = 64;

impl ProgressionState {
    pub fn has_processed(&self, event_id: Uuid) -> bool {
        self.processed_events.contains(&event_id)
    }

    pub fn mark_processed(&mut self, event_id: Uuid) {
        self.processed_events.push(event_id);
        if self.processed_events.len() > PROCESSED_EVENT_WINDOW {
            let excess = self.processed_events.len() - PROCESSED_EVENT_WINDOW;
            self.processed_events.drain(..excess);
        }
    }
}

/// A progression rule: what it listens for, which max it mutates, and its
/// variant parameters plus runtime counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    pub id: Uuid,
    pub name: String,
    pub trigger_type: TriggerType,
    pub max_type: MaxType,
    pub params: ProgressionParams,
    #[serde(default)]
    pub state: ProgressionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProgression {
    pub name: String,
    pub trigger_type: TriggerType,
    pub max_type: MaxType,
    pub params: ProgressionParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgression {
    pub name: Option<String>,
    pub trigger_type: Option<TriggerType>,
    pub max_type: Option<MaxType>,
    pub params: Option<ProgressionParams>,
}

impl CreateProgression {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.error("name", "name is required");
        }
        report.merge(crate::engine::progression::validate_params(&self.params));
        report
    }
}

/// What one progression application reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionOutcome {
    pub applied: bool,
    pub previous_value: f64,
    pub new_value: f64,
    pub delta: f64,
    pub reason: Option<String>,
}

impl ProgressionOutcome {
    pub fn unchanged(current: f64, reason: impl Into<String>) -> Self {
        Self {
            applied: false,
            previous_value: current,
            new_value: current,
            delta: 0.0,
            reason: Some(reason.into()),
        }
    }

    pub fn changed(previous: f64, new_value: f64) -> Self {
        Self {
            applied: true,
            previous_value: previous,
            new_value,
            delta: new_value - previous,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
