use crate::models::{GeneratedSet, Rounding, SetScheme};

use super::lookup::LookupContext;
use super::rounding::round_with;
use super::EngineError;

/// A rep target as it comes out of a weekly lookup or a scheme definition.
/// Negative values mean "at least |r|, AMRAP".
fn unpack_reps(reps: i32, scheme_amrap: bool) -> (i32, bool) {
    if reps < 0 {
        (-reps, true)
    } else {
        (reps, scheme_amrap)
    }
}

/// Expand one prescription's scheme into concrete sets. `base_weight` maps
/// a 1-based set number to the raw strategy weight for that set (set 0 is
/// the ramp base, free of per-set overrides); rounding is applied here,
/// once, on the final per-set figure.
pub fn generate(
    scheme: &SetScheme,
    stage_index: u32,
    rounding: Rounding,
    ctx: &LookupContext<'_>,
    mut base_weight: impl FnMut(i32) -> Result<f64, EngineError>,
) -> Result<Vec<GeneratedSet>, EngineError> {
    match scheme {
        SetScheme::Fixed { sets, reps, is_amrap } => {
            fixed_sets(*sets, *reps, *is_amrap, false, rounding, ctx, &mut base_weight)
        }
        SetScheme::Amrap { sets, reps } => {
            fixed_sets(*sets, *reps, true, true, rounding, ctx, &mut base_weight)
        }
        SetScheme::Ramp { steps, work_set_threshold } => {
            let base = base_weight(0)?;
            let mut generated = Vec::with_capacity(steps.len());
            for (idx, step) in steps.iter().enumerate() {
                let set_number = idx as i32 + 1;
                let percentage = step
                    .percentage
                    .or_else(|| ctx.percentage_for_set(set_number))
                    .ok_or(EngineError::MissingStepPercentage { step: idx })?;
                let weight = round_with(base * percentage / 100.0, rounding)?;
                let raw_reps = step
                    .reps
                    .or_else(|| ctx.reps_for_set(set_number))
                    .ok_or(EngineError::MissingStepReps { step: idx })?;
                let (target_reps, is_amrap) = unpack_reps(raw_reps, step.is_amrap);
                generated.push(GeneratedSet {
                    set_number,
                    weight,
                    target_reps,
                    is_amrap,
                    // The threshold judges the step's own percentage, before
                    // any lookup scaling touches the weight.
                    is_work_set: percentage >= *work_set_threshold,
                });
            }
            Ok(generated)
        }
        SetScheme::Stage { stages } => {
            // The progression owns the index; a stale one clamps to the
            // last stage rather than failing the workout.
            let stage = stages
                .get((stage_index as usize).min(stages.len().saturating_sub(1)))
                .ok_or_else(|| {
                    EngineError::Misconfigured("stage scheme has no stages".to_string())
                })?;
            fixed_sets(
                stage.sets,
                stage.reps,
                stage.is_amrap,
                false,
                rounding,
                ctx,
                &mut base_weight,
            )
        }
    }
}

fn fixed_sets(
    sets: u32,
    reps: i32,
    amrap_last: bool,
    amrap_all: bool,
    rounding: Rounding,
    ctx: &LookupContext<'_>,
    base_weight: &mut impl FnMut(i32) -> Result<f64, EngineError>,
) -> Result<Vec<GeneratedSet>, EngineError> {
    let mut generated = Vec::with_capacity(sets as usize);
    for i in 1..=sets as i32 {
        let weight = round_with(base_weight(i)?, rounding)?;
        let scheme_amrap = amrap_all || (amrap_last && i == sets as i32);
        let raw_reps = ctx.reps_for_set(i).unwrap_or(reps);
        let (target_reps, is_amrap) = unpack_reps(raw_reps, scheme_amrap);
        generated.push(GeneratedSet {
            set_number: i,
            weight,
            target_reps,
            is_amrap,
            is_work_set: true,
        });
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RampStep;

    fn bare_ctx() -> LookupContext<'static> {
        LookupContext {
            week_number: 1,
            day_slug: "a",
            set_number: 0,
            rotation_position: 0,
            weekly: None,
            daily: None,
            rotation: None,
        }
    }

    #[test]
    fn fixed_marks_only_the_last_set_amrap() {
        let scheme = SetScheme::Fixed { sets: 3, reps: 5, is_amrap: true };
        let sets = generate(&scheme, 0, Rounding::default(), &bare_ctx(), |_| Ok(225.0)).unwrap();
        assert_eq!(sets.len(), 3);
        assert!(sets.iter().all(|s| s.weight == 225.0 && s.target_reps == 5 && s.is_work_set));
        assert_eq!(sets.iter().filter(|s| s.is_amrap).count(), 1);
        assert!(sets[2].is_amrap);
    }

    #[test]
    fn ramp_judges_work_sets_on_step_percentage() {
        let scheme = SetScheme::Ramp {
            steps: vec![
                RampStep { percentage: Some(50.0), reps: Some(5), is_amrap: false },
                RampStep { percentage: Some(63.0), reps: Some(5), is_amrap: false },
                RampStep { percentage: Some(75.0), reps: Some(5), is_amrap: false },
                RampStep { percentage: Some(88.0), reps: Some(5), is_amrap: false },
                RampStep { percentage: Some(100.0), reps: Some(5), is_amrap: false },
            ],
            work_set_threshold: 80.0,
        };
        // Base already carries a daily 0.9 modifier: 300 → 270.
        let sets = generate(&scheme, 0, Rounding::default(), &bare_ctx(), |_| Ok(270.0)).unwrap();
        let weights: Vec<f64> = sets.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![135.0, 170.0, 205.0, 240.0, 270.0]);
        let work: Vec<bool> = sets.iter().map(|s| s.is_work_set).collect();
        assert_eq!(work, vec![false, false, false, true, true]);
    }

    #[test]
    fn ramp_without_percentage_needs_the_lookup() {
        let scheme = SetScheme::Ramp {
            steps: vec![RampStep { percentage: None, reps: Some(5), is_amrap: false }],
            work_set_threshold: 80.0,
        };
        let err = generate(&scheme, 0, Rounding::default(), &bare_ctx(), |_| Ok(300.0)).unwrap_err();
        assert_eq!(err, EngineError::MissingStepPercentage { step: 0 });
    }

    #[test]
    fn stage_renders_only_the_current_stage() {
        let scheme = SetScheme::Stage {
            stages: vec![
                crate::models::StageDef { name: "t2 a".to_string(), sets: 5, reps: 3, is_amrap: false, min_volume: 15 },
                crate::models::StageDef { name: "t2 b".to_string(), sets: 6, reps: 2, is_amrap: false, min_volume: 12 },
            ],
        };
        let first = generate(&scheme, 0, Rounding::default(), &bare_ctx(), |_| Ok(200.0)).unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].target_reps, 3);

        let second = generate(&scheme, 1, Rounding::default(), &bare_ctx(), |_| Ok(200.0)).unwrap();
        assert_eq!(second.len(), 6);
        assert_eq!(second[0].target_reps, 2);

        // A stale index clamps to the final stage.
        let clamped = generate(&scheme, 9, Rounding::default(), &bare_ctx(), |_| Ok(200.0)).unwrap();
        assert_eq!(clamped.len(), 6);
    }
}
