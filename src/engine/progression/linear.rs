use crate::models::ProgressionOutcome;

use super::{EngineError, ProgressionCtx};

/// Unconditional fixed bump. The same math serves the per-session /
/// per-week linear rule and the per-cycle rule; only the declared trigger
/// differs.
pub fn apply(increment: f64, ctx: &ProgressionCtx<'_>) -> Result<ProgressionOutcome, EngineError> {
    Ok(ProgressionOutcome::changed(
        ctx.current_value,
        ctx.current_value + increment,
    ))
}
