use crate::models::{Rounding, RoundingDirection};

use super::EngineError;

/// Ratios are snapped to nine decimals before flooring or ceiling so that
/// FP residue from percentage multiplication (e.g. 0.63 * 300) cannot push
/// a value across an increment boundary.
const RATIO_SNAP: f64 = 1e9;

/// Round `weight` to a multiple of `increment` in the given direction.
/// Nearest rounds half away from zero. Zero weight stays zero.
pub fn round(weight: f64, increment: f64, direction: RoundingDirection) -> Result<f64, EngineError> {
    if weight < 0.0 {
        return Err(EngineError::NegativeWeight);
    }
    if increment <= 0.0 {
        return Err(EngineError::InvalidIncrement);
    }
    if weight == 0.0 {
        return Ok(0.0);
    }

    let ratio = (weight / increment * RATIO_SNAP).round() / RATIO_SNAP;
    let steps = match direction {
        RoundingDirection::Down => ratio.floor(),
        RoundingDirection::Up => ratio.ceil(),
        RoundingDirection::Nearest => ratio.round(),
    };
    Ok(steps * increment)
}

pub fn round_with(weight: f64, rounding: Rounding) -> Result<f64, EngineError> {
    round(weight, rounding.increment, rounding.direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rounds_half_away_from_zero() {
        assert_eq!(round(202.5, 5.0, RoundingDirection::Nearest).unwrap(), 205.0);
        assert_eq!(round(237.6, 5.0, RoundingDirection::Nearest).unwrap(), 240.0);
        assert_eq!(round(170.1, 5.0, RoundingDirection::Nearest).unwrap(), 170.0);
    }

    #[test]
    fn directional_rounding() {
        assert_eq!(round(283.5, 5.0, RoundingDirection::Down).unwrap(), 280.0);
        assert_eq!(round(283.5, 5.0, RoundingDirection::Up).unwrap(), 285.0);
        assert_eq!(round(280.0, 5.0, RoundingDirection::Up).unwrap(), 280.0);
    }

    #[test]
    fn zero_weight_stays_zero() {
        assert_eq!(round(0.0, 5.0, RoundingDirection::Up).unwrap(), 0.0);
    }

    #[test]
    fn rejects_negative_weight_and_bad_increment() {
        assert_eq!(round(-1.0, 5.0, RoundingDirection::Nearest), Err(EngineError::NegativeWeight));
        assert_eq!(round(100.0, 0.0, RoundingDirection::Nearest), Err(EngineError::InvalidIncrement));
        assert_eq!(round(100.0, -2.5, RoundingDirection::Nearest), Err(EngineError::InvalidIncrement));
    }

    #[test]
    fn fp_residue_does_not_cross_boundaries() {
        // 0.63 * 300 carries binary residue; Down must still land on 185,
        // not fall through to 180.
        let weight = 300.0 * 0.63;
        assert_eq!(round(weight, 5.0, RoundingDirection::Nearest).unwrap(), 190.0);
        // 0.88 * 300 = 264.000…06; Up must not jump to 270.
        let weight = 300.0 * 0.88;
        assert_eq!(round(weight, 5.0, RoundingDirection::Up).unwrap(), 265.0);
    }

    #[test]
    fn quarter_increment() {
        assert_eq!(round(202.62, 0.25, RoundingDirection::Nearest).unwrap(), 202.5);
        assert_eq!(round(202.63, 0.25, RoundingDirection::Nearest).unwrap(), 202.75);
    }
}
