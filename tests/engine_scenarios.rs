// End-to-end program scenarios over the in-memory store: seed a program
// graph, enroll, and drive generation, logging, and advancement through the
// services exactly the way the HTTP surface does.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use power_pro::models::*;
use power_pro::services::WorkoutQuery;

#[tokio::test]
async fn starting_strength_day_a_first_session() {
    let env = TestEnv::new();

    let squat = lift(&env.repos, "Squat", "squat").await;
    let bench = lift(&env.repos, "Bench Press", "bench-press").await;
    let deadlift = lift(&env.repos, "Deadlift", "deadlift").await;
    training_max(&env.repos, env.user_id, squat.id, 225.0).await;
    training_max(&env.repos, env.user_id, bench.id, 155.0).await;
    training_max(&env.repos, env.user_id, deadlift.id, 275.0).await;

    let fixed_3x5 = SetScheme::Fixed { sets: 3, reps: 5, is_amrap: false };
    let squat_rx = prescription(
        &env.repos,
        squat.id,
        percent_of_tm(100.0, LookupKey::None),
        fixed_3x5.clone(),
        0,
    )
    .await;
    let bench_rx = prescription(
        &env.repos,
        bench.id,
        percent_of_tm(100.0, LookupKey::None),
        fixed_3x5,
        1,
    )
    .await;
    let deadlift_rx = prescription(
        &env.repos,
        deadlift.id,
        percent_of_tm(100.0, LookupKey::None),
        SetScheme::Fixed { sets: 1, reps: 5, is_amrap: false },
        2,
    )
    .await;

    let day_a =
        day_with_prescriptions(&env.repos, "Day A", "day-a", &[squat_rx.id, bench_rx.id, deadlift_rx.id])
            .await;
    let cycle = cycle_of_weeks(&env.repos, "linear week", vec![vec![day_a.id]]).await;
    let prog = program(&env.repos, "Starting Strength", "starting-strength", cycle.id, None, None).await;

    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let workout = env
        .workouts
        .generate(env.user_id, WorkoutQuery::default())
        .await
        .unwrap();

    assert_eq!(workout.week_number, 1);
    assert_eq!(workout.day_slug, "day-a");
    assert_eq!(workout.exercises.len(), 3);

    let squat_sets = &workout.exercises[0].sets;
    assert_eq!(squat_sets.len(), 3);
    assert!(squat_sets.iter().all(|s| s.weight == 225.0 && s.target_reps == 5 && s.is_work_set));

    let bench_sets = &workout.exercises[1].sets;
    assert!(bench_sets.iter().all(|s| s.weight == 155.0 && s.target_reps == 5 && s.is_work_set));

    let deadlift_sets = &workout.exercises[2].sets;
    assert_eq!(deadlift_sets.len(), 1);
    assert_eq!(deadlift_sets[0].weight, 275.0);
    assert!(deadlift_sets[0].is_work_set);
}

#[tokio::test]
async fn five_three_one_bbb_week_one_squat_day() {
    let env = TestEnv::new();

    let squat = lift(&env.repos, "Squat", "squat").await;
    training_max(&env.repos, env.user_id, squat.id, 315.0).await;

    let now = chrono::Utc::now();
    let weekly = env
        .repos
        .lookups
        .create_weekly(WeeklyLookup {
            id: Uuid::new_v4(),
            name: "531 wave".to_string(),
            entries: vec![WeeklyLookupEntry {
                week_number: 1,
                percentages: Some(vec![65.0, 75.0, 85.0]),
                reps: Some(vec![5, 5, -5]),
                percentage_modifier: None,
            }],
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let main = prescription(
        &env.repos,
        squat.id,
        percent_of_tm(100.0, LookupKey::Both),
        SetScheme::Fixed { sets: 3, reps: 5, is_amrap: false },
        0,
    )
    .await;
    let supplemental = prescription(
        &env.repos,
        squat.id,
        percent_of_tm(50.0, LookupKey::None),
        SetScheme::Fixed { sets: 5, reps: 10, is_amrap: false },
        1,
    )
    .await;

    let day = day_with_prescriptions(&env.repos, "Squat Day", "squat-day", &[main.id, supplemental.id]).await;
    let cycle = cycle_of_weeks(&env.repos, "531 cycle", vec![vec![day.id]]).await;
    let prog = program(&env.repos, "5/3/1 BBB", "531-bbb", cycle.id, Some(weekly.id), None).await;

    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let workout = env
        .workouts
        .generate(env.user_id, WorkoutQuery::default())
        .await
        .unwrap();

    let main_sets = &workout.exercises[0].sets;
    let weights: Vec<f64> = main_sets.iter().map(|s| s.weight).collect();
    assert_eq!(weights, vec![205.0, 235.0, 270.0]);
    assert!(!main_sets[0].is_amrap);
    assert!(!main_sets[1].is_amrap);
    assert!(main_sets[2].is_amrap);
    assert_eq!(main_sets[2].target_reps, 5);

    let bbb_sets = &workout.exercises[1].sets;
    assert_eq!(bbb_sets.len(), 5);
    assert!(bbb_sets.iter().all(|s| s.weight == 160.0 && s.target_reps == 10));
}

#[tokio::test]
async fn bill_starr_medium_day_scales_after_the_threshold_check() {
    let env = TestEnv::new();

    let squat = lift(&env.repos, "Squat", "squat").await;
    training_max(&env.repos, env.user_id, squat.id, 300.0).await;

    let now = chrono::Utc::now();
    let daily = env
        .repos
        .lookups
        .create_daily(DailyLookup {
            id: Uuid::new_v4(),
            name: "heavy light medium".to_string(),
            entries: vec![DailyLookupEntry {
                day_identifier: "medium".to_string(),
                percentage_modifier: 90.0,
                intensity_level: Some("medium".to_string()),
            }],
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let ramp = SetScheme::Ramp {
        steps: [50.0, 63.0, 75.0, 88.0, 100.0]
            .iter()
            .map(|pct| RampStep { percentage: Some(*pct), reps: Some(5), is_amrap: false })
            .collect(),
        work_set_threshold: 80.0,
    };
    let rx = prescription(&env.repos, squat.id, percent_of_tm(100.0, LookupKey::Both), ramp, 0).await;

    let day = day_with_prescriptions(&env.repos, "Medium", "medium", &[rx.id]).await;
    let cycle = cycle_of_weeks(&env.repos, "hlm", vec![vec![day.id]]).await;
    let prog = program(&env.repos, "Bill Starr 5x5", "bill-starr", cycle.id, None, Some(daily.id)).await;

    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let workout = env
        .workouts
        .generate(env.user_id, WorkoutQuery::default())
        .await
        .unwrap();

    let sets = &workout.exercises[0].sets;
    let weights: Vec<f64> = sets.iter().map(|s| s.weight).collect();
    assert_eq!(weights, vec![135.0, 170.0, 205.0, 240.0, 270.0]);
    // Work sets are judged on the raw step percentage, before the daily
    // lookup scales the weights.
    let work: Vec<bool> = sets.iter().map(|s| s.is_work_set).collect();
    assert_eq!(work, vec![false, false, false, true, true]);
}

#[tokio::test]
async fn greyskull_amrap_under_minimum_deloads_ten_percent() {
    let env = TestEnv::new();

    let bench = lift(&env.repos, "Bench Press", "bench-press").await;
    training_max(&env.repos, env.user_id, bench.id, 200.0).await;

    let rx = prescription(
        &env.repos,
        bench.id,
        percent_of_tm(100.0, LookupKey::None),
        SetScheme::Fixed { sets: 3, reps: 5, is_amrap: true },
        0,
    )
    .await;
    let day = day_with_prescriptions(&env.repos, "Day A", "day-a", &[rx.id]).await;
    let cycle = cycle_of_weeks(&env.repos, "gslp", vec![vec![day.id]]).await;
    let prog = program(&env.repos, "GreySkull LP", "greyskull-lp", cycle.id, None, None).await;

    let rule = progression(
        &env.repos,
        "bench greyskull",
        TriggerType::AfterSet,
        MaxType::TrainingMax,
        ProgressionParams::GreySkull {
            increment: 2.5,
            min_reps: 5,
            double_threshold: 10,
            deload_percent: 0.10,
        },
    )
    .await;
    link_progression(&env.repos, prog.id, rule.id, bench.id, 0).await;

    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let session = env
        .sessions
        .start(env.user_id, StartSessionRequest { week_number: None, day_index: None })
        .await
        .unwrap();

    let (_, reports) = env
        .sessions
        .log_set(
            session.id,
            CreateSetRecord {
                prescription_id: rx.id,
                lift_id: bench.id,
                set_number: 3,
                weight: 200.0,
                target_reps: 5,
                reps_performed: 3,
                is_amrap: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let outcome = &reports[0].outcome;
    assert!(outcome.applied);
    assert_eq!(outcome.previous_value, 200.0);
    assert_eq!(outcome.new_value, 180.0);
    assert_eq!(outcome.delta, -20.0);

    let current = env
        .repos
        .lift_maxes
        .current(env.user_id, bench.id, MaxType::TrainingMax)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.value, 180.0);
}

#[tokio::test]
async fn texas_method_two_consecutive_failures_deload() {
    let env = TestEnv::new();

    let squat = lift(&env.repos, "Squat", "squat").await;
    training_max(&env.repos, env.user_id, squat.id, 315.0).await;

    let rx = prescription(
        &env.repos,
        squat.id,
        percent_of_tm(100.0, LookupKey::None),
        SetScheme::Fixed { sets: 1, reps: 5, is_amrap: false },
        0,
    )
    .await;
    let day = day_with_prescriptions(&env.repos, "Intensity", "intensity", &[rx.id]).await;
    let cycle = cycle_of_weeks(&env.repos, "texas week", vec![vec![day.id]]).await;
    let prog = program(&env.repos, "Texas Method", "texas-method", cycle.id, None, None).await;

    let rule = progression(
        &env.repos,
        "squat deload on failure",
        TriggerType::AfterSession,
        MaxType::TrainingMax,
        ProgressionParams::DeloadOnFailure {
            failure_threshold: 2,
            deload: DeloadAmount::Percent { value: 0.10 },
        },
    )
    .await;
    link_progression(&env.repos, prog.id, rule.id, squat.id, 0).await;

    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    async fn failed_session(
        env: &TestEnv,
        rx_id: uuid::Uuid,
        lift_id: uuid::Uuid,
    ) -> Vec<power_pro::services::ProgressionReport> {
        let session = env
            .sessions
            .start(env.user_id, StartSessionRequest { week_number: None, day_index: None })
            .await
            .unwrap();
        env.sessions
            .log_set(
                session.id,
                CreateSetRecord {
                    prescription_id: rx_id,
                    lift_id,
                    set_number: 1,
                    weight: 315.0,
                    target_reps: 5,
                    reps_performed: 3,
                    is_amrap: false,
                },
            )
            .await
            .unwrap();
        let (_, reports) = env.sessions.complete(session.id).await.unwrap();
        reports
    }

    // First failure: counter ticks, no max change.
    let reports = failed_session(&env, rx.id, squat.id).await;
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].outcome.applied);
    let current = env
        .repos
        .lift_maxes
        .current(env.user_id, squat.id, MaxType::TrainingMax)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.value, 315.0);

    // Second failure: 315 * 0.9 = 283.5 → 285 at the default 5 nearest.
    let reports = failed_session(&env, rx.id, squat.id).await;
    assert!(reports[0].outcome.applied);
    assert_eq!(reports[0].outcome.new_value, 285.0);

    let current = env
        .repos
        .lift_maxes
        .current(env.user_id, squat.id, MaxType::TrainingMax)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.value, 285.0);
}

#[tokio::test]
async fn advance_through_two_week_two_day_cycle() {
    let env = TestEnv::new();

    let day_a = day_with_prescriptions(&env.repos, "Day 1", "day-1", &[]).await;
    let day_b = day_with_prescriptions(&env.repos, "Day 2", "day-2", &[]).await;
    let cycle = cycle_of_weeks(
        &env.repos,
        "two by two",
        vec![vec![day_a.id, day_b.id], vec![day_a.id, day_b.id]],
    )
    .await;
    let prog = program(&env.repos, "Two by Two", "two-by-two", cycle.id, None, None).await;

    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let expectations = [
        (1, Some(1), 1, false),
        (2, Some(0), 1, false),
        (2, Some(1), 1, false),
        (1, Some(0), 2, true),
    ];
    for (week, day, iteration, completed) in expectations {
        let response = env.states.advance(env.user_id).await.unwrap();
        assert_eq!(response.state.current_week, week);
        assert_eq!(response.state.current_day_index, day);
        assert_eq!(response.state.current_cycle_iteration, iteration);
        assert_eq!(response.cycle_completed, completed);
    }
}

#[tokio::test]
async fn parallel_advances_serialize_to_one_linear_history() {
    let env = TestEnv::new();

    let day_a = day_with_prescriptions(&env.repos, "Day 1", "day-1", &[]).await;
    let day_b = day_with_prescriptions(&env.repos, "Day 2", "day-2", &[]).await;
    let cycle = cycle_of_weeks(
        &env.repos,
        "two by two",
        vec![vec![day_a.id, day_b.id], vec![day_a.id, day_b.id]],
    )
    .await;
    let prog = program(&env.repos, "Two by Two", "two-by-two", cycle.id, None, None).await;
    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let states = env.states.clone();
        let user_id = env.user_id;
        handles.push(tokio::spawn(async move { states.advance(user_id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Eight serial advances through a 2x2 cycle land back at (1, 0) with
    // two completed cycles.
    let state = env.states.get(env.user_id).await.unwrap();
    assert_eq!(state.current_week, 1);
    assert_eq!(state.current_day_index, Some(0));
    assert_eq!(state.current_cycle_iteration, 3);
    assert_eq!(state.cycles_since_start, 2);
}

#[tokio::test]
async fn generation_is_repeatable_for_fixed_inputs() {
    let env = TestEnv::new();

    let squat = lift(&env.repos, "Squat", "squat").await;
    training_max(&env.repos, env.user_id, squat.id, 300.0).await;
    let rx = prescription(
        &env.repos,
        squat.id,
        percent_of_tm(80.0, LookupKey::None),
        SetScheme::Fixed { sets: 5, reps: 5, is_amrap: false },
        0,
    )
    .await;
    let day = day_with_prescriptions(&env.repos, "Volume", "volume", &[rx.id]).await;
    let cycle = cycle_of_weeks(&env.repos, "week", vec![vec![day.id]]).await;
    let prog = program(&env.repos, "Plain", "plain", cycle.id, None, None).await;
    env.states
        .enroll(env.user_id, EnrollRequest { program_id: prog.id, meet_date: None })
        .await
        .unwrap();

    let query = WorkoutQuery {
        date: chrono::NaiveDate::from_ymd_opt(2025, 6, 2),
        week: None,
        day_slug: None,
    };
    let first = env.workouts.generate(env.user_id, query.clone()).await.unwrap();
    let second = env.workouts.generate(env.user_id, query).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.exercises[0].sets[0].weight, 240.0);
}
