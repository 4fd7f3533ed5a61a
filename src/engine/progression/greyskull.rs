use crate::models::ProgressionOutcome;

use super::{EngineError, ProgressionCtx};
use crate::engine::rounding::round_with;

/// AMRAP-driven three-band rule: below the minimum deloads, the normal
/// band adds one increment, at or past the double threshold adds two.
pub fn apply(
    increment: f64,
    min_reps: i32,
    double_threshold: i32,
    deload_percent: f64,
    ctx: &ProgressionCtx<'_>,
) -> Result<ProgressionOutcome, EngineError> {
    let set = match ctx.triggering_set {
        Some(set) if set.is_amrap => set,
        _ => {
            return Ok(ProgressionOutcome::unchanged(
                ctx.current_value,
                "requires an amrap set",
            ))
        }
    };

    let reps = set.reps_performed;
    let current = ctx.current_value;

    if reps < min_reps {
        let deloaded = (current * (1.0 - deload_percent)).max(0.0);
        let new_value = round_with(deloaded, ctx.rounding)?;
        return Ok(ProgressionOutcome::changed(current, new_value)
            .with_reason(format!("{reps} reps under the {min_reps}-rep minimum")));
    }

    let bump = if reps >= double_threshold {
        2.0 * increment
    } else {
        increment
    };
    Ok(ProgressionOutcome::changed(current, current + bump))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rounding, SetRecord, TriggerType};
    use chrono::Utc;
    use uuid::Uuid;

    fn amrap_set(reps: i32) -> SetRecord {
        SetRecord {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            prescription_id: Uuid::new_v4(),
            lift_id: Uuid::new_v4(),
            set_number: 3,
            weight: 200.0,
            target_reps: 5,
            reps_performed: reps,
            is_amrap: true,
            logged_at: Utc::now(),
        }
    }

    fn ctx<'a>(current: f64, set: Option<&'a SetRecord>) -> ProgressionCtx<'a> {
        ProgressionCtx {
            event_id: Uuid::new_v4(),
            trigger: TriggerType::AfterSet,
            current_value: current,
            rounding: Rounding::default(),
            triggering_set: set,
            lift_sets: &[],
            week_number: 1,
        }
    }

    #[test]
    fn three_reps_on_a_two_hundred_bench_deloads_to_one_eighty() {
        let set = amrap_set(3);
        let outcome = apply(2.5, 5, 10, 0.10, &ctx(200.0, Some(&set))).unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.new_value, 180.0);
        assert_eq!(outcome.delta, -20.0);
    }

    #[test]
    fn normal_band_adds_one_increment() {
        let set = amrap_set(7);
        let outcome = apply(2.5, 5, 10, 0.10, &ctx(200.0, Some(&set))).unwrap();
        assert_eq!(outcome.new_value, 202.5);
    }

    #[test]
    fn double_threshold_doubles_the_increment() {
        let set = amrap_set(10);
        let outcome = apply(2.5, 5, 10, 0.10, &ctx(200.0, Some(&set))).unwrap();
        assert_eq!(outcome.new_value, 205.0);

        let set = amrap_set(14);
        let outcome = apply(5.0, 5, 10, 0.10, &ctx(300.0, Some(&set))).unwrap();
        assert_eq!(outcome.new_value, 310.0);
    }

    #[test]
    fn non_amrap_sets_do_not_apply() {
        let mut set = amrap_set(8);
        set.is_amrap = false;
        let outcome = apply(2.5, 5, 10, 0.10, &ctx(200.0, Some(&set))).unwrap();
        assert!(!outcome.applied);

        let outcome = apply(2.5, 5, 10, 0.10, &ctx(200.0, None)).unwrap();
        assert!(!outcome.applied);
    }

    #[test]
    fn new_value_is_nondecreasing_in_reps_outside_the_deload_cliff() {
        let mut last = f64::MIN;
        for reps in 5..20 {
            let set = amrap_set(reps);
            let outcome = apply(2.5, 5, 10, 0.10, &ctx(200.0, Some(&set))).unwrap();
            assert!(outcome.new_value >= last);
            last = outcome.new_value;
        }
        // Below the minimum sits strictly lower than any success band.
        let set = amrap_set(4);
        let deloaded = apply(2.5, 5, 10, 0.10, &ctx(200.0, Some(&set))).unwrap();
        assert!(deloaded.new_value < 200.0);
    }
}
