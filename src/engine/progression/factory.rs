//! Stock progression constructors. New variants register here; nothing
//! outside this module and the dispatcher enumerates the parameter tags.

use crate::models::{DeloadAmount, ProgressionParams};

/// Build a stock parameter set by registry name. Returns `None` for
/// unknown names so callers can fall back to explicit parameters.
pub fn builtin(name: &str) -> Option<ProgressionParams> {
    match name {
        "linear-5" => Some(ProgressionParams::Linear { increment: 5.0 }),
        "linear-2p5" => Some(ProgressionParams::Linear { increment: 2.5 }),
        "cycle-5" => Some(ProgressionParams::Cycle { increment: 5.0 }),
        "cycle-10" => Some(ProgressionParams::Cycle { increment: 10.0 }),
        "greyskull-main-upper" => Some(ProgressionParams::GreySkull {
            increment: 2.5,
            min_reps: 5,
            double_threshold: 10,
            deload_percent: 0.10,
        }),
        "greyskull-main-lower" => Some(ProgressionParams::GreySkull {
            increment: 5.0,
            min_reps: 5,
            double_threshold: 10,
            deload_percent: 0.10,
        }),
        "greyskull-accessory-upper" => Some(ProgressionParams::GreySkull {
            increment: 2.5,
            min_reps: 10,
            double_threshold: 15,
            deload_percent: 0.10,
        }),
        "greyskull-accessory-lower" => Some(ProgressionParams::GreySkull {
            increment: 5.0,
            min_reps: 10,
            double_threshold: 15,
            deload_percent: 0.10,
        }),
        "deload-on-failure-10pct" => Some(ProgressionParams::DeloadOnFailure {
            failure_threshold: 2,
            deload: DeloadAmount::Percent { value: 0.10 },
        }),
        "juggernaut-upper" => Some(ProgressionParams::Juggernaut {
            increment: 2.5,
            cycle_increment: 5.0,
            wave_length: 4,
        }),
        "juggernaut-lower" => Some(ProgressionParams::Juggernaut {
            increment: 5.0,
            cycle_increment: 10.0,
            wave_length: 4,
        }),
        _ => None,
    }
}

/// Registry listing for the API's progression catalog endpoint.
pub fn builtin_names() -> &'static [&'static str] {
    &[
        "linear-5",
        "linear-2p5",
        "cycle-5",
        "cycle-10",
        "greyskull-main-upper",
        "greyskull-main-lower",
        "greyskull-accessory-upper",
        "greyskull-accessory-lower",
        "deload-on-failure-10pct",
        "juggernaut-upper",
        "juggernaut-lower",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progression::validate_params;

    #[test]
    fn every_builtin_validates() {
        for name in builtin_names() {
            let params = builtin(name).expect("registered name must build");
            assert!(validate_params(&params).valid(), "{name} failed validation");
        }
    }

    #[test]
    fn unknown_names_are_none() {
        assert!(builtin("madcow").is_none());
    }
}
