use crate::models::{ProgressionOutcome, TriggerType};

use super::{EngineError, ProgressionCtx};

/// Rep standards for the four waves: 10s, 8s, 5s, 3s.
const WAVE_STANDARDS: [i32; 4] = [10, 8, 5, 3];

/// Wave realization bumps the training max by the AMRAP surplus over the
/// wave's rep standard; the completed cycle adds a flat base bump.
pub fn apply(
    increment: f64,
    cycle_increment: f64,
    wave_length: i32,
    ctx: &ProgressionCtx<'_>,
) -> Result<ProgressionOutcome, EngineError> {
    match ctx.trigger {
        TriggerType::AfterCycle => Ok(ProgressionOutcome::changed(
            ctx.current_value,
            ctx.current_value + cycle_increment,
        )),
        TriggerType::AfterWeek => realization(increment, wave_length, ctx),
        _ => Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            "only weekly realization and cycle events apply",
        )),
    }
}

fn realization(
    increment: f64,
    wave_length: i32,
    ctx: &ProgressionCtx<'_>,
) -> Result<ProgressionOutcome, EngineError> {
    if wave_length < 1 {
        return Err(EngineError::Misconfigured(
            "juggernaut wave length must be at least 1".to_string(),
        ));
    }

    // Third week of each wave is the realization exposure.
    let week_in_wave = (ctx.week_number - 1).rem_euclid(wave_length) + 1;
    if week_in_wave != 3 {
        return Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            format!("week {} of the wave is not a realization week", week_in_wave),
        ));
    }

    let wave = ((ctx.week_number - 1) / wave_length) as usize;
    let standard = match WAVE_STANDARDS.get(wave) {
        Some(standard) => *standard,
        None => {
            return Ok(ProgressionOutcome::unchanged(
                ctx.current_value,
                "week is past the final wave",
            ))
        }
    };

    let top_amrap = ctx
        .lift_sets
        .iter()
        .filter(|set| set.is_amrap)
        .max_by_key(|set| set.reps_performed);
    let reps = match top_amrap {
        Some(set) => set.reps_performed,
        None => {
            return Ok(ProgressionOutcome::unchanged(
                ctx.current_value,
                "no amrap set logged this week",
            ))
        }
    };

    let new_value = ctx.current_value + f64::from(reps - standard) * increment;
    Ok(
        ProgressionOutcome::changed(ctx.current_value, new_value).with_reason(format!(
            "{reps} reps against the {standard}-rep standard"
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rounding, SetRecord};
    use chrono::Utc;
    use uuid::Uuid;

    fn amrap_set(reps: i32) -> SetRecord {
        SetRecord {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            prescription_id: Uuid::new_v4(),
            lift_id: Uuid::new_v4(),
            set_number: 5,
            weight: 250.0,
            target_reps: 10,
            reps_performed: reps,
            is_amrap: true,
            logged_at: Utc::now(),
        }
    }

    fn ctx<'a>(
        trigger: TriggerType,
        week: i32,
        current: f64,
        sets: &'a [SetRecord],
    ) -> ProgressionCtx<'a> {
        ProgressionCtx {
            event_id: Uuid::new_v4(),
            trigger,
            current_value: current,
            rounding: Rounding::default(),
            triggering_set: None,
            lift_sets: sets,
            week_number: week,
        }
    }

    #[test]
    fn tens_wave_surplus_bumps_by_increment_per_rep() {
        // Week 3 is the realization of the 10s wave; 13 reps is +3 over
        // standard, worth 15 at the lower-body increment.
        let sets = vec![amrap_set(13)];
        let outcome = apply(5.0, 10.0, 4, &ctx(TriggerType::AfterWeek, 3, 300.0, &sets)).unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.new_value, 315.0);
    }

    #[test]
    fn shortfall_lowers_the_training_max() {
        let sets = vec![amrap_set(3)];
        // Week 11: realization of the 5s wave.
        let outcome = apply(2.5, 5.0, 4, &ctx(TriggerType::AfterWeek, 11, 200.0, &sets)).unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.new_value, 195.0);
    }

    #[test]
    fn non_realization_weeks_are_skipped() {
        let sets = vec![amrap_set(12)];
        for week in [1, 2, 4] {
            let outcome =
                apply(5.0, 10.0, 4, &ctx(TriggerType::AfterWeek, week, 300.0, &sets)).unwrap();
            assert!(!outcome.applied, "week {week} should not realize");
        }
    }

    #[test]
    fn cycle_event_adds_the_base_bump() {
        let outcome = apply(5.0, 10.0, 4, &ctx(TriggerType::AfterCycle, 16, 300.0, &[])).unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.new_value, 310.0);
    }

    #[test]
    fn realization_needs_an_amrap_set() {
        let outcome = apply(5.0, 10.0, 4, &ctx(TriggerType::AfterWeek, 3, 300.0, &[])).unwrap();
        assert!(!outcome.applied);
    }
}
