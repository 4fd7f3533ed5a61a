use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Cycle, DailyLookup, Day, Lift, Prescription, Program, ResolvedWorkout, RotationLookup,
    UserProgramState, Week, WeeklyLookup,
};

use super::load::MaxIndex;
use super::lookup::LookupContext;
use super::resolver;
use super::EngineError;

/// One day of the target week with its prescriptions already ordered.
#[derive(Debug, Clone)]
pub struct DayPlan {
    pub day: Day,
    pub prescriptions: Vec<Prescription>,
}

/// The target week with its days in authoritative order.
#[derive(Debug, Clone)]
pub struct WeekPlan {
    pub week: Week,
    pub days: Vec<DayPlan>,
}

/// Everything generation reads, assembled by the workout service in one
/// pass over the repositories. Generation itself is pure: same snapshot,
/// same output.
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    pub program: Program,
    pub cycle: Cycle,
    pub week: WeekPlan,
    pub lifts: HashMap<Uuid, Lift>,
    pub weekly: Option<WeeklyLookup>,
    pub daily: Option<DailyLookup>,
    pub rotation: Option<RotationLookup>,
}

/// End-to-end pipeline: state → week → day → prescriptions → resolved
/// sets. Prescriptions resolve in authored order and are never reordered.
pub fn generate(
    snapshot: &PlanSnapshot,
    state: &UserProgramState,
    maxes: &MaxIndex,
    stage_indexes: &HashMap<Uuid, u32>,
    date: NaiveDate,
) -> Result<ResolvedWorkout, EngineError> {
    if state.current_week > snapshot.cycle.length_weeks {
        return Err(EngineError::WeekOutOfRange {
            week_number: state.current_week,
            length_weeks: snapshot.cycle.length_weeks,
        });
    }
    if snapshot.week.days.is_empty() {
        return Err(EngineError::EmptyWeek {
            week_number: state.current_week,
        });
    }

    // First day of the week until advancement says otherwise.
    let day_index = state.current_day_index.unwrap_or(0);
    let day_plan = snapshot
        .week
        .days
        .get(day_index as usize)
        .ok_or(EngineError::DayOutOfRange {
            day_index,
            days: snapshot.week.days.len(),
        })?;

    let ctx = LookupContext {
        week_number: state.current_week,
        day_slug: &day_plan.day.slug,
        set_number: 0,
        rotation_position: state.rotation_position,
        weekly: snapshot.weekly.as_ref(),
        daily: snapshot.daily.as_ref(),
        rotation: snapshot.rotation.as_ref(),
    };

    let mut resolved_weights = HashMap::new();
    let mut exercises = Vec::with_capacity(day_plan.prescriptions.len());
    for prescription in &day_plan.prescriptions {
        let lift = snapshot
            .lifts
            .get(&prescription.lift_id)
            .ok_or(EngineError::LiftNotFound {
                lift_id: prescription.lift_id,
            })?;
        let stage_index = stage_indexes
            .get(&prescription.lift_id)
            .copied()
            .unwrap_or(0);
        let exercise = resolver::resolve(
            prescription,
            lift,
            &ctx,
            maxes,
            stage_index,
            &mut resolved_weights,
        )?;
        exercises.push(exercise);
    }

    Ok(ResolvedWorkout {
        user_id: state.user_id,
        program_id: snapshot.program.id,
        cycle_iteration: state.current_cycle_iteration,
        week_number: state.current_week,
        day_slug: day_plan.day.slug.clone(),
        date,
        exercises,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EnrollmentStatus, LoadStrategy, LookupKey, MaxType, PhaseStatus, Rounding, ScheduleType,
        SetScheme,
    };
    use chrono::Utc;

    fn lift(name: &str, slug: &str) -> Lift {
        Lift {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            is_competition_lift: true,
            parent_lift_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tm_prescription(lift_id: Uuid, sets: u32, reps: i32, order: i32) -> Prescription {
        Prescription {
            id: Uuid::new_v4(),
            lift_id,
            load_strategy: LoadStrategy::PercentOf {
                reference: MaxType::TrainingMax,
                percentage: 100.0,
                rounding: Rounding::default(),
                lookup_key: LookupKey::Both,
            },
            set_scheme: SetScheme::Fixed { sets, reps, is_amrap: false },
            order,
            notes: None,
            rest_seconds: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot_for(lifts: Vec<Lift>, prescriptions: Vec<Prescription>) -> PlanSnapshot {
        let cycle = Cycle {
            id: Uuid::new_v4(),
            name: "linear".to_string(),
            length_weeks: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let day = Day {
            id: Uuid::new_v4(),
            name: "Day A".to_string(),
            slug: "day-a".to_string(),
            metadata: None,
            program_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let week = Week {
            id: Uuid::new_v4(),
            cycle_id: cycle.id,
            week_number: 1,
            variant: None,
        };
        PlanSnapshot {
            program: Program {
                id: Uuid::new_v4(),
                name: "Starting Strength".to_string(),
                slug: "starting-strength".to_string(),
                description: None,
                cycle_id: cycle.id,
                weekly_lookup_id: None,
                daily_lookup_id: None,
                rotation_lookup_id: None,
                default_rounding: Rounding::default(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            cycle,
            week: WeekPlan {
                week,
                days: vec![DayPlan { day, prescriptions }],
            },
            lifts: lifts.into_iter().map(|l| (l.id, l)).collect(),
            weekly: None,
            daily: None,
            rotation: None,
        }
    }

    fn state_for(program_id: Uuid, user_id: Uuid) -> UserProgramState {
        UserProgramState {
            id: Uuid::new_v4(),
            user_id,
            program_id,
            current_week: 1,
            current_cycle_iteration: 1,
            current_day_index: None,
            rotation_position: 0,
            cycles_since_start: 0,
            meet_date: None,
            schedule_type: ScheduleType::Rotation,
            enrollment_status: EnrollmentStatus::Active,
            cycle_status: PhaseStatus::InProgress,
            week_status: PhaseStatus::InProgress,
            enrolled_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn generation_is_deterministic_and_ordered() {
        let squat = lift("Squat", "squat");
        let bench = lift("Bench Press", "bench-press");
        let prescriptions = vec![
            tm_prescription(squat.id, 3, 5, 0),
            tm_prescription(bench.id, 3, 5, 1),
        ];
        let snapshot = snapshot_for(vec![squat.clone(), bench.clone()], prescriptions);
        let state = state_for(snapshot.program.id, Uuid::new_v4());

        let mut maxes = MaxIndex::new();
        maxes.insert(squat.id, MaxType::TrainingMax, 225.0);
        maxes.insert(bench.id, MaxType::TrainingMax, 155.0);

        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let first = generate(&snapshot, &state, &maxes, &HashMap::new(), date).unwrap();
        let second = generate(&snapshot, &state, &maxes, &HashMap::new(), date).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.exercises[0].lift.slug, "squat");
        assert_eq!(first.exercises[1].lift.slug, "bench-press");
        assert_eq!(first.day_slug, "day-a");
    }

    #[test]
    fn one_failed_prescription_fails_the_workout() {
        let squat = lift("Squat", "squat");
        let deadlift = lift("Deadlift", "deadlift");
        let prescriptions = vec![
            tm_prescription(squat.id, 3, 5, 0),
            tm_prescription(deadlift.id, 1, 5, 1),
        ];
        let snapshot = snapshot_for(vec![squat.clone(), deadlift.clone()], prescriptions);
        let state = state_for(snapshot.program.id, Uuid::new_v4());

        // Deadlift max missing: the whole generation must fail.
        let mut maxes = MaxIndex::new();
        maxes.insert(squat.id, MaxType::TrainingMax, 225.0);

        let err = generate(
            &snapshot,
            &state,
            &maxes,
            &HashMap::new(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MaxNotFound { .. }));
    }
}
