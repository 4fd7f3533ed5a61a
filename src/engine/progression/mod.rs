// Progression rules: pure per-variant apply/validate over an event
// context. The variant set is closed; construction of the stock rules goes
// through the factory so nothing else enumerates the tags.

mod deload;
mod greyskull;
mod juggernaut;
mod linear;
mod stage;

pub mod factory;

use uuid::Uuid;

use crate::models::{
    ProgressionOutcome, ProgressionParams, ProgressionState, Rounding, SetRecord, TriggerType,
    ValidationReport,
};

use super::EngineError;

/// Everything one progression application reads. Assembled by the
/// progression service from the event and the repositories.
#[derive(Debug, Clone)]
pub struct ProgressionCtx<'a> {
    /// Event tag; re-delivering a tagged event is a no-op.
    pub event_id: Uuid,
    pub trigger: TriggerType,
    /// Current value of the max this progression mutates.
    pub current_value: f64,
    /// The program's default rounding, applied to deload results.
    pub rounding: Rounding,
    /// The set that fired an AFTER_SET event.
    pub triggering_set: Option<&'a SetRecord>,
    /// This event's sets for the progression's lift (session or week scope).
    pub lift_sets: &'a [SetRecord],
    pub week_number: i32,
}

/// Whether a progression should see an event. Normally a straight trigger
/// match; Juggernaut additionally answers the cycle event for its base
/// bump even though it declares the weekly realization trigger.
pub fn responds_to(params: &ProgressionParams, declared: TriggerType, event: TriggerType) -> bool {
    if declared == event {
        return true;
    }
    matches!(
        (params, event),
        (ProgressionParams::Juggernaut { .. }, TriggerType::AfterCycle)
    )
}

/// Apply one progression to its current max. `state` is the rule's own
/// persistent counters and is mutated in place; the caller persists it in
/// the same transaction as the resulting max write.
pub fn apply(
    params: &ProgressionParams,
    state: &mut ProgressionState,
    ctx: &ProgressionCtx<'_>,
) -> Result<ProgressionOutcome, EngineError> {
    if state.has_processed(ctx.event_id) {
        return Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            "event already applied",
        ));
    }

    let outcome = match params {
        ProgressionParams::Linear { increment } | ProgressionParams::Cycle { increment } => {
            linear::apply(*increment, ctx)
        }
        ProgressionParams::GreySkull {
            increment,
            min_reps,
            double_threshold,
            deload_percent,
        } => greyskull::apply(*increment, *min_reps, *double_threshold, *deload_percent, ctx),
        ProgressionParams::Stage {
            stages,
            deload_percent,
            reset_on_exhaustion,
        } => stage::apply(stages, *deload_percent, *reset_on_exhaustion, state, ctx),
        ProgressionParams::DeloadOnFailure {
            failure_threshold,
            deload,
        } => deload::apply(*failure_threshold, *deload, state, ctx),
        ProgressionParams::Juggernaut {
            increment,
            cycle_increment,
            wave_length,
        } => juggernaut::apply(*increment, *cycle_increment, *wave_length, ctx),
    }?;

    state.mark_processed(ctx.event_id);
    Ok(outcome)
}

/// Structural validation of variant parameters, run at progression
/// create/update time and again before each application.
pub fn validate_params(params: &ProgressionParams) -> ValidationReport {
    let mut report = ValidationReport::new();
    match params {
        ProgressionParams::Linear { increment } | ProgressionParams::Cycle { increment } => {
            if *increment <= 0.0 {
                report.error("params.increment", "increment must be positive");
            }
        }
        ProgressionParams::GreySkull {
            increment,
            min_reps,
            double_threshold,
            deload_percent,
        } => {
            if *increment <= 0.0 {
                report.error("params.increment", "increment must be positive");
            }
            if *min_reps <= 0 {
                report.error("params.min_reps", "minimum reps must be positive");
            }
            if *double_threshold <= *min_reps {
                report.error(
                    "params.double_threshold",
                    "double threshold must be strictly greater than minimum reps",
                );
            }
            if *deload_percent <= 0.0 || *deload_percent > 1.0 {
                report.error("params.deload_percent", "deload must be in (0, 1]");
            }
        }
        ProgressionParams::Stage {
            stages,
            deload_percent,
            ..
        } => {
            if stages.is_empty() {
                report.error("params.stages", "at least one stage is required");
            }
            for (i, stage) in stages.iter().enumerate() {
                if stage.min_volume < 0 {
                    report.error(
                        &format!("params.stages[{i}].min_volume"),
                        "minimum volume must be nonnegative",
                    );
                }
            }
            if *deload_percent <= 0.0 || *deload_percent > 1.0 {
                report.error("params.deload_percent", "deload must be in (0, 1]");
            }
        }
        ProgressionParams::DeloadOnFailure {
            failure_threshold,
            deload,
        } => {
            if *failure_threshold == 0 {
                report.error("params.failure_threshold", "failure threshold must be at least 1");
            }
            match deload {
                crate::models::DeloadAmount::Percent { value } => {
                    if *value <= 0.0 || *value > 1.0 {
                        report.error("params.deload.value", "deload percent must be in (0, 1]");
                    }
                }
                crate::models::DeloadAmount::Fixed { value } => {
                    if *value <= 0.0 {
                        report.error("params.deload.value", "fixed deload must be positive");
                    }
                }
            }
        }
        ProgressionParams::Juggernaut {
            increment,
            cycle_increment,
            wave_length,
        } => {
            if *increment <= 0.0 {
                report.error("params.increment", "increment must be positive");
            }
            if *cycle_increment <= 0.0 {
                report.error("params.cycle_increment", "cycle increment must be positive");
            }
            if *wave_length < 1 {
                report.error("params.wave_length", "wave length must be at least 1");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TriggerType;

    fn ctx(current: f64) -> ProgressionCtx<'static> {
        ProgressionCtx {
            event_id: Uuid::new_v4(),
            trigger: TriggerType::AfterSession,
            current_value: current,
            rounding: Rounding::default(),
            triggering_set: None,
            lift_sets: &[],
            week_number: 1,
        }
    }

    #[test]
    fn redelivered_events_are_no_ops() {
        let params = ProgressionParams::Linear { increment: 5.0 };
        let mut state = ProgressionState::default();
        let context = ctx(225.0);

        let first = apply(&params, &mut state, &context).unwrap();
        assert!(first.applied);
        assert_eq!(first.new_value, 230.0);

        let second = apply(&params, &mut state, &context).unwrap();
        assert!(!second.applied);
        assert_eq!(second.new_value, 225.0);
        assert_eq!(second.reason.as_deref(), Some("event already applied"));
    }

    #[test]
    fn juggernaut_also_answers_cycle_events() {
        let juggernaut = ProgressionParams::Juggernaut {
            increment: 2.5,
            cycle_increment: 5.0,
            wave_length: 4,
        };
        assert!(responds_to(&juggernaut, TriggerType::AfterWeek, TriggerType::AfterWeek));
        assert!(responds_to(&juggernaut, TriggerType::AfterWeek, TriggerType::AfterCycle));

        let linear = ProgressionParams::Linear { increment: 5.0 };
        assert!(!responds_to(&linear, TriggerType::AfterSession, TriggerType::AfterCycle));
    }

    #[test]
    fn greyskull_validation_requires_strict_threshold() {
        let bad = ProgressionParams::GreySkull {
            increment: 2.5,
            min_reps: 5,
            double_threshold: 5,
            deload_percent: 0.10,
        };
        let report = validate_params(&bad);
        assert!(!report.valid());
        assert!(report.errors[0].field.contains("double_threshold"));
    }
}
