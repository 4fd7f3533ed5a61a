use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Lift, LiftInfo, Prescription, ResolvedExercise};

use super::load::{strategy_weight, MaxIndex};
use super::lookup::LookupContext;
use super::scheme;
use super::EngineError;

/// Resolve one prescription into concrete sets. Fails atomically: an
/// unresolvable set weight aborts the prescription rather than emitting a
/// partial set list.
///
/// `resolved` carries the top work-set weight of every prescription already
/// resolved in this workout, which is what computed load strategies read;
/// on success this prescription's own top work set is added to it.
pub fn resolve(
    prescription: &Prescription,
    lift: &Lift,
    ctx: &LookupContext<'_>,
    maxes: &MaxIndex,
    stage_index: u32,
    resolved: &mut HashMap<Uuid, f64>,
) -> Result<ResolvedExercise, EngineError> {
    let rounding = prescription.load_strategy.rounding();
    let sets = scheme::generate(
        &prescription.set_scheme,
        stage_index,
        rounding,
        ctx,
        |set_number| {
            let set_ctx = ctx.with_set(set_number);
            strategy_weight(
                &prescription.load_strategy,
                prescription.lift_id,
                &set_ctx,
                maxes,
                resolved,
            )
        },
    )?;

    let exercise = ResolvedExercise {
        prescription_id: prescription.id,
        lift: LiftInfo {
            id: lift.id,
            name: lift.name.clone(),
            slug: lift.slug.clone(),
        },
        sets,
        notes: prescription.notes.clone(),
        rest_seconds: prescription.rest_seconds,
    };

    if let Some(top) = exercise.top_work_set() {
        resolved.insert(prescription.id, top.weight);
    }

    Ok(exercise)
}
