// Property checks over the engine's universal invariants.

use proptest::prelude::*;

use power_pro::engine::advance::advance;
use power_pro::engine::max_math::MaxCalculator;
use power_pro::engine::progression::{apply, ProgressionCtx};
use power_pro::engine::rounding::round;
use power_pro::engine::EngineConfig;
use power_pro::models::{
    EnrollmentStatus, PhaseStatus, ProgressionParams, ProgressionState, Rounding,
    RoundingDirection, ScheduleType, SetRecord, TriggerType, UserProgramState,
};

use chrono::Utc;
use uuid::Uuid;

const EPS: f64 = 1e-9;

fn fresh_state() -> UserProgramState {
    let now = Utc::now();
    UserProgramState {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        program_id: Uuid::new_v4(),
        current_week: 1,
        current_cycle_iteration: 1,
        current_day_index: None,
        rotation_position: 0,
        cycles_since_start: 0,
        meet_date: None,
        schedule_type: ScheduleType::Rotation,
        enrollment_status: EnrollmentStatus::Active,
        cycle_status: PhaseStatus::Pending,
        week_status: PhaseStatus::Pending,
        enrolled_at: now,
        updated_at: now,
    }
}

fn amrap_set(reps: i32) -> SetRecord {
    SetRecord {
        id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
        prescription_id: Uuid::new_v4(),
        lift_id: Uuid::new_v4(),
        set_number: 1,
        weight: 200.0,
        target_reps: 5,
        reps_performed: reps,
        is_amrap: true,
        logged_at: Utc::now(),
    }
}

proptest! {
    // round() lands on a multiple of the increment, within one increment
    // of the input, and Down ≤ w ≤ Up with Nearest as one of the two.
    #[test]
    fn rounding_stays_on_the_increment_grid(
        weight_cents in 0u32..400_000,
        increment_quarters in 1u32..100,
    ) {
        let weight = f64::from(weight_cents) / 100.0;
        let increment = f64::from(increment_quarters) * 0.25;

        let down = round(weight, increment, RoundingDirection::Down).unwrap();
        let up = round(weight, increment, RoundingDirection::Up).unwrap();
        let nearest = round(weight, increment, RoundingDirection::Nearest).unwrap();

        for result in [down, up, nearest] {
            prop_assert!(result >= 0.0);
            let steps = result / increment;
            prop_assert!((steps - steps.round()).abs() < EPS, "{result} is off the {increment} grid");
            prop_assert!((result - weight).abs() <= increment + EPS);
        }
        prop_assert!(down <= weight + EPS);
        prop_assert!(up >= weight - EPS);
        prop_assert!((nearest - down).abs() < EPS || (nearest - up).abs() < EPS);
    }

    // TM→1RM round-trips exactly whenever the scaled value lands on the
    // quarter grid, which multiples of five against these percents do.
    #[test]
    fn training_max_conversion_round_trips(
        fives in 1u32..200,
        percent_index in 0usize..6,
    ) {
        let calc = MaxCalculator::new(&EngineConfig::default());
        let one_rm = f64::from(fives) * 5.0;
        let percent = [50.0, 60.0, 75.0, 80.0, 90.0, 100.0][percent_index];

        let tm = calc.to_training_max(one_rm, Some(percent)).unwrap();
        let back = calc.to_one_rm(tm, Some(percent)).unwrap();
        prop_assert!((back - one_rm).abs() < EPS, "{one_rm} @ {percent}% went to {tm} and back to {back}");
    }

    // Exactly D*W advances complete one full cycle and return to the
    // origin, firing the cycle signal exactly once.
    #[test]
    fn advance_is_periodic_in_days_times_weeks(
        days in 1usize..6,
        weeks in 1i32..6,
    ) {
        let mut state = fresh_state();
        let now = Utc::now();
        let mut completions = 0;

        for step in 0..(days as i32 * weeks) {
            let outcome = advance(&state, days, weeks, 0, now).unwrap();
            if outcome.cycle_completed {
                completions += 1;
                prop_assert_eq!(step, days as i32 * weeks - 1, "cycle completed early");
            }
            state = outcome.state;
        }

        prop_assert_eq!(completions, 1);
        prop_assert_eq!(state.current_week, 1);
        prop_assert_eq!(state.current_day_index, Some(0));
        prop_assert_eq!(state.cycles_since_start, 1);
    }

    // GreySkull: at a fixed weight, the new value never decreases as reps
    // climb, except across the failure threshold where it strictly drops.
    #[test]
    fn greyskull_is_monotone_in_reps(current_times_four in 400u32..2000) {
        let current = f64::from(current_times_four) / 4.0;
        let params = ProgressionParams::GreySkull {
            increment: 2.5,
            min_reps: 5,
            double_threshold: 10,
            deload_percent: 0.10,
        };

        let value_for = |reps: i32| {
            let set = amrap_set(reps);
            let ctx = ProgressionCtx {
                event_id: Uuid::new_v4(),
                trigger: TriggerType::AfterSet,
                current_value: current,
                rounding: Rounding::default(),
                triggering_set: Some(&set),
                lift_sets: &[],
                week_number: 1,
            };
            let mut state = ProgressionState::default();
            apply(&params, &mut state, &ctx).unwrap().new_value
        };

        let mut last = f64::MIN;
        for reps in 5..25 {
            let value = value_for(reps);
            prop_assert!(value >= last - EPS);
            last = value;
        }
        for reps in 0..5 {
            prop_assert!(value_for(reps) < current);
        }
    }
}

#[test]
fn default_tm_percent_round_trip_on_quarter_values() {
    let calc = MaxCalculator::new(&EngineConfig::default());
    // Multiples of 2.5 scale to the quarter grid at 90%.
    for k in 1..200 {
        let one_rm = f64::from(k) * 2.5;
        let tm = calc.to_training_max(one_rm, None).unwrap();
        let back = calc.to_one_rm(tm, None).unwrap();
        assert_eq!(back, one_rm);
    }
}

#[test]
fn e1rm_estimates_match_the_chart_rows() {
    let calc = MaxCalculator::new(&EngineConfig::default());
    // 8 reps at RPE 7.5 is 72.3%: 225 / 0.723 = 311.2 → 310 at 2.5.
    assert_eq!(calc.estimate_one_rm(225.0, 8, 7.5).unwrap(), 310.0);
    // 12 reps at RPE 7 is the bottom-right cell.
    assert!(calc.estimate_one_rm(100.0, 12, 7.0).is_ok());
    assert!(calc.estimate_one_rm(100.0, 12, 6.5).is_err());
}
