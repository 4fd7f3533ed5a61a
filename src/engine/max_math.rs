use std::collections::HashMap;

use crate::models::{RoundingDirection, ValidationReport};

use super::rounding::round;
use super::{EngineConfig, EngineError};

/// Maxes are stored on the atomic barbell grid.
const MAX_PRECISION: f64 = 0.25;

/// RPE-to-percentage chart: (reps 1..=12, RPE 7.0..=10.0 in half steps) →
/// percent of 1RM. Keys hold RPE scaled by ten to stay hashable.
#[derive(Debug, Clone)]
pub struct RpeChart {
    entries: HashMap<(u32, u32), f64>,
}

/// Percent-of-1RM rows for reps 1..=12, columns RPE 10 down to 7 in half
/// steps. The standard RTS-derived chart.
const RPE_ROWS: [[f64; 7]; 12] = [
    [100.0, 97.8, 95.5, 93.9, 92.2, 90.7, 89.2],
    [95.5, 93.9, 92.2, 90.7, 89.2, 87.8, 86.3],
    [92.2, 90.7, 89.2, 87.8, 86.3, 85.0, 83.7],
    [89.2, 87.8, 86.3, 85.0, 83.7, 82.4, 81.1],
    [86.3, 85.0, 83.7, 82.4, 81.1, 79.9, 78.6],
    [83.7, 82.4, 81.1, 79.9, 78.6, 77.4, 76.2],
    [81.1, 79.9, 78.6, 77.4, 76.2, 75.1, 73.9],
    [78.6, 77.4, 76.2, 75.1, 73.9, 72.3, 70.7],
    [76.2, 75.1, 73.9, 72.3, 70.7, 69.4, 68.0],
    [73.9, 72.3, 70.7, 69.4, 68.0, 66.7, 65.3],
    [70.7, 69.4, 68.0, 66.7, 65.3, 64.0, 62.6],
    [68.0, 66.7, 65.3, 64.0, 62.6, 61.3, 59.9],
];

impl RpeChart {
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        for (rep_idx, row) in RPE_ROWS.iter().enumerate() {
            let reps = rep_idx as u32 + 1;
            for (col, percent) in row.iter().enumerate() {
                let rpe_tenths = 100 - col as u32 * 5;
                entries.insert((reps, rpe_tenths), *percent);
            }
        }
        Self { entries }
    }

    /// Fraction of 1RM for a (reps, rpe) cell.
    pub fn factor(&self, reps: u32, rpe: f64) -> Result<f64, EngineError> {
        let rpe_tenths = (rpe * 10.0).round() as u32;
        // Half-step RPEs only; anything else is off the chart.
        if (rpe * 10.0 - rpe_tenths as f64).abs() > 1e-9 {
            return Err(EngineError::EntryNotFound { reps, rpe });
        }
        self.entries
            .get(&(reps, rpe_tenths))
            .map(|percent| percent / 100.0)
            .ok_or(EngineError::EntryNotFound { reps, rpe })
    }
}

/// Conversions between the three species of max. Rounding-aware: results
/// land on the 0.25 grid maxes are stored on.
#[derive(Debug, Clone)]
pub struct MaxCalculator {
    training_max_percent: f64,
    e1rm_increment: f64,
    chart: RpeChart,
}

impl MaxCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            training_max_percent: config.training_max_percent,
            e1rm_increment: config.e1rm_increment,
            chart: config.rpe_chart.clone(),
        }
    }

    /// 1RM → training max at `percent` (falls back to the configured
    /// default), rounded to 0.25.
    pub fn to_training_max(&self, one_rm: f64, percent: Option<f64>) -> Result<f64, EngineError> {
        let percent = percent.unwrap_or(self.training_max_percent);
        if percent <= 0.0 || percent > 100.0 {
            return Err(EngineError::Misconfigured(format!(
                "training max percent {percent} is outside (0, 100]"
            )));
        }
        round(one_rm * percent / 100.0, MAX_PRECISION, RoundingDirection::Nearest)
    }

    /// Training max → 1RM, the inverse of `to_training_max`.
    pub fn to_one_rm(&self, training_max: f64, percent: Option<f64>) -> Result<f64, EngineError> {
        let percent = percent.unwrap_or(self.training_max_percent);
        if percent <= 0.0 || percent > 100.0 {
            return Err(EngineError::Misconfigured(format!(
                "training max percent {percent} is outside (0, 100]"
            )));
        }
        round(training_max * 100.0 / percent, MAX_PRECISION, RoundingDirection::Nearest)
    }

    /// Estimated 1RM from a submaximal set, rounded to the finest barbell
    /// increment.
    pub fn estimate_one_rm(&self, weight: f64, reps: u32, rpe: f64) -> Result<f64, EngineError> {
        let factor = self.chart.factor(reps, rpe)?;
        round(
            weight / factor,
            self.e1rm_increment,
            RoundingDirection::Nearest,
        )
    }

    /// Sanity band for a training max against the current 1RM: inside
    /// [80%, 95%] is silent; outside produces exactly one warning.
    pub fn training_max_warnings(&self, training_max: f64, one_rm: f64) -> ValidationReport {
        let mut report = ValidationReport::new();
        if one_rm <= 0.0 {
            return report;
        }
        let ratio = training_max / one_rm;
        if ratio < 0.80 {
            report.warning(
                "value",
                format!(
                    "training max {training_max} is below 80% of the current 1RM {one_rm}"
                ),
            );
        } else if ratio > 0.95 {
            report.warning(
                "value",
                format!(
                    "training max {training_max} is above 95% of the current 1RM {one_rm}"
                ),
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> MaxCalculator {
        MaxCalculator::new(&EngineConfig::default())
    }

    #[test]
    fn training_max_defaults_to_ninety_percent() {
        let calc = calculator();
        assert_eq!(calc.to_training_max(250.0, None).unwrap(), 225.0);
        assert_eq!(calc.to_one_rm(225.0, None).unwrap(), 250.0);
    }

    #[test]
    fn conversions_land_on_quarter_grid() {
        let calc = calculator();
        // 317.5 * 0.85 = 269.875, half a quarter-step up from 269.75.
        let tm = calc.to_training_max(317.5, Some(85.0)).unwrap();
        assert_eq!(tm, 270.0);
        assert_eq!((tm * 4.0).fract(), 0.0);
    }

    #[test]
    fn e1rm_from_rpe_chart() {
        let calc = calculator();
        // 5 reps at RPE 8 is 81.1%; 250 / 0.811 = 308.26 → 307.5 at 2.5.
        assert_eq!(calc.estimate_one_rm(250.0, 5, 8.0).unwrap(), 307.5);
        // A single at RPE 10 is the lift itself.
        assert_eq!(calc.estimate_one_rm(300.0, 1, 10.0).unwrap(), 300.0);
    }

    #[test]
    fn chart_misses_are_entry_not_found() {
        let calc = calculator();
        assert_eq!(
            calc.estimate_one_rm(200.0, 13, 8.0),
            Err(EngineError::EntryNotFound { reps: 13, rpe: 8.0 })
        );
        assert_eq!(
            calc.estimate_one_rm(200.0, 5, 6.5),
            Err(EngineError::EntryNotFound { reps: 5, rpe: 6.5 })
        );
        assert_eq!(
            calc.estimate_one_rm(200.0, 5, 8.25),
            Err(EngineError::EntryNotFound { reps: 5, rpe: 8.25 })
        );
    }

    #[test]
    fn tm_band_warnings() {
        let calc = calculator();
        assert!(calc.training_max_warnings(225.0, 250.0).warnings.is_empty());
        assert_eq!(calc.training_max_warnings(180.0, 250.0).warnings.len(), 1);
        assert!(calc.training_max_warnings(180.0, 250.0).warnings[0]
            .message
            .contains("below 80%"));
        assert_eq!(calc.training_max_warnings(245.0, 250.0).warnings.len(), 1);
        assert!(calc.training_max_warnings(245.0, 250.0).warnings[0]
            .message
            .contains("above 95%"));
    }
}
