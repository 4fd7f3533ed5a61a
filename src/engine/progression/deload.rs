use crate::models::{DeloadAmount, ProgressionOutcome, ProgressionState};

use super::{EngineError, ProgressionCtx};
use crate::engine::rounding::round_with;

/// Consecutive-failure tracking: a session with any missed set bumps the
/// counter, a clean session zeroes it, and hitting the threshold applies
/// the deload and resets.
pub fn apply(
    failure_threshold: u32,
    deload: DeloadAmount,
    state: &mut ProgressionState,
    ctx: &ProgressionCtx<'_>,
) -> Result<ProgressionOutcome, EngineError> {
    if ctx.lift_sets.is_empty() {
        return Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            "no sets logged for this lift",
        ));
    }

    let failed = ctx
        .lift_sets
        .iter()
        .any(|set| set.reps_performed < set.target_reps);

    if !failed {
        state.consecutive_failures = 0;
        return Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            "session successful; failure streak reset",
        ));
    }

    state.consecutive_failures += 1;
    if state.consecutive_failures < failure_threshold {
        return Ok(ProgressionOutcome::unchanged(
            ctx.current_value,
            format!(
                "failure {} of {} before deload",
                state.consecutive_failures, failure_threshold
            ),
        ));
    }

    state.consecutive_failures = 0;
    let target = match deload {
        DeloadAmount::Percent { value } => ctx.current_value * (1.0 - value),
        DeloadAmount::Fixed { value } => (ctx.current_value - value).max(0.0),
    };
    let new_value = round_with(target, ctx.rounding)?;
    Ok(ProgressionOutcome::changed(ctx.current_value, new_value)
        .with_reason(format!("{failure_threshold} consecutive failures; deloading")))
}
