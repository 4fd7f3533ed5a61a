use crate::models::{ProgressionOutcome, ProgressionStage, ProgressionState};

use super::{EngineError, ProgressionCtx};
use crate::engine::rounding::round_with;

/// Volume-gated stage cycling. Meeting the current stage's minimum session
/// volume holds the stage; missing it moves to the next. Exhausting the
/// final stage resets to stage zero and deloads the max when configured.
pub fn apply(
    stages: &[ProgressionStage],
    deload_percent: f64,
    reset_on_exhaustion: bool,
    state: &mut ProgressionState,
    ctx: &ProgressionCtx<'_>,
) -> Result<ProgressionOutcome, EngineError> {
    if stages.is_empty() {
        return Err(EngineError::Misconfigured(
            "stage progression has no stages".to_string(),
        ));
    }

    let index = (state.stage_index as usize).min(stages.len() - 1);
    let stage = &stages[index];
    let total_reps: i32 = ctx.lift_sets.iter().map(|s| s.reps_performed).sum();

    if total_reps >= stage.min_volume {
        return Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            format!(
                "volume {total_reps} met stage \"{}\" minimum {}",
                stage.name, stage.min_volume
            ),
        ));
    }

    if index + 1 < stages.len() {
        state.stage_index = index as u32 + 1;
        let mut outcome = ProgressionOutcome::changed(ctx.current_value, ctx.current_value);
        outcome.reason = Some(format!(
            "volume {total_reps} under minimum {}; moving to stage \"{}\"",
            stage.min_volume,
            stages[index + 1].name
        ));
        return Ok(outcome);
    }

    if reset_on_exhaustion {
        state.stage_index = 0;
        let deloaded = round_with(ctx.current_value * (1.0 - deload_percent), ctx.rounding)?;
        return Ok(ProgressionOutcome::changed(ctx.current_value, deloaded)
            .with_reason("stage cycle exhausted; resetting to stage one with a deload"));
    }

    Ok(ProgressionOutcome::unchanged(
        ctx.current_value,
        "final stage missed; holding",
    ))
}
