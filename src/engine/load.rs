use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{LoadStrategy, MaxType};

use super::lookup::LookupContext;
use super::EngineError;

/// Current maxes for the lifts under resolution, keyed by (lift, type).
/// The workout service assembles this from the repository; the engine only
/// reads it.
#[derive(Debug, Clone, Default)]
pub struct MaxIndex {
    values: HashMap<(Uuid, MaxType), f64>,
}

impl MaxIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lift_id: Uuid, max_type: MaxType, value: f64) {
        self.values.insert((lift_id, max_type), value);
    }

    pub fn get(&self, lift_id: Uuid, max_type: MaxType) -> Option<f64> {
        self.values.get(&(lift_id, max_type)).copied()
    }
}

/// Raw (unrounded) weight for one set of a prescription. Rounding happens
/// once, on the final per-set figure, so ramp steps do not accumulate two
/// rounding passes.
pub fn strategy_weight(
    strategy: &LoadStrategy,
    lift_id: Uuid,
    ctx: &LookupContext<'_>,
    maxes: &MaxIndex,
    resolved: &HashMap<Uuid, f64>,
) -> Result<f64, EngineError> {
    match strategy {
        LoadStrategy::PercentOf {
            reference,
            percentage,
            lookup_key,
            ..
        } => {
            let max = maxes
                .get(lift_id, *reference)
                .ok_or(EngineError::MaxNotFound {
                    lift_id,
                    max_type: *reference,
                })?;
            let effective = ctx.apply_modifiers(*percentage, *lookup_key);
            Ok(max * effective / 100.0)
        }
        LoadStrategy::FixedWeight { weight, .. } => Ok(*weight),
        LoadStrategy::Computed {
            source_prescription_id,
            percentage,
            ..
        } => {
            let source = resolved
                .get(source_prescription_id)
                .copied()
                .ok_or(EngineError::UnresolvedSource {
                    prescription_id: *source_prescription_id,
                })?;
            Ok(source * percentage / 100.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LookupKey, Rounding};

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
    fn percent_of_reads_the_referenced_max() {
        let lift_id = Uuid::new_v4();
        let mut maxes = MaxIndex::new();
        maxes.insert(lift_id, MaxType::TrainingMax, 300.0);

        let strategy = LoadStrategy::PercentOf {
            reference: MaxType::TrainingMax,
            percentage: 85.0,
            rounding: Rounding::default(),
            lookup_key: LookupKey::None,
        };
        let weight =
            strategy_weight(&strategy, lift_id, &bare_ctx(), &maxes, &HashMap::new()).unwrap();
        assert!((weight - 255.0).abs() < 1e-9);
    }

    #[test]
    fn missing_max_is_an_error() {
        let lift_id = Uuid::new_v4();
        let strategy = LoadStrategy::PercentOf {
            reference: MaxType::OneRm,
            percentage: 85.0,
            rounding: Rounding::default(),
            lookup_key: LookupKey::None,
        };
        let err = strategy_weight(
            &strategy,
            lift_id,
            &bare_ctx(),
            &MaxIndex::new(),
            &HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::MaxNotFound {
                lift_id,
                max_type: MaxType::OneRm
            }
        );
    }

    #[test]
    fn computed_derives_from_an_earlier_prescription() {
        let source_id = Uuid::new_v4();
        let mut resolved = HashMap::new();
        resolved.insert(source_id, 300.0);

        let strategy = LoadStrategy::Computed {
            source_prescription_id: source_id,
            percentage: 50.0,
            rounding: Rounding::default(),
        };
        let weight = strategy_weight(
            &strategy,
            Uuid::new_v4(),
            &bare_ctx(),
            &MaxIndex::new(),
            &resolved,
        )
        .unwrap();
        assert!((weight - 150.0).abs() < 1e-9);

        let unresolved = LoadStrategy::Computed {
            source_prescription_id: Uuid::new_v4(),
            percentage: 50.0,
            rounding: Rounding::default(),
        };
        assert!(matches!(
            strategy_weight(&unresolved, Uuid::new_v4(), &bare_ctx(), &MaxIndex::new(), &resolved),
            Err(EngineError::UnresolvedSource { .. })
        ));
    }
}
