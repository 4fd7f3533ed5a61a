// Shared fixtures for the integration suites: an in-memory store with the
// services wired over it, plus seeding helpers for program graphs.

use chrono::Utc;
use uuid::Uuid;

use power_pro::engine::EngineConfig;
use power_pro::models::*;
use power_pro::repos::Repos;
use power_pro::services::{
    MaxService, ProgressionService, SessionService, StateService, UserLocks, WorkoutService,
};

pub struct TestEnv {
    pub repos: Repos,
    pub maxes: MaxService,
    pub workouts: WorkoutService,
    pub sessions: SessionService,
    pub progressions: ProgressionService,
    pub states: StateService,
    pub user_id: Uuid,
}

impl TestEnv {
    pub fn new() -> Self {
        let repos = Repos::in_memory();
        let locks = UserLocks::new();
        let progressions = ProgressionService::new(repos.clone(), locks.clone());
        Self {
            maxes: MaxService::new(repos.clone(), &EngineConfig::default()),
            workouts: WorkoutService::new(repos.clone()),
            sessions: SessionService::new(repos.clone(), locks.clone(), progressions.clone()),
            states: StateService::new(repos.clone(), locks, progressions.clone()),
            progressions,
            repos,
            user_id: Uuid::new_v4(),
        }
    }
}

pub async fn lift(repos: &Repos, name: &str, slug: &str) -> Lift {
    let now = Utc::now();
    repos
        .lifts
        .create(Lift {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            is_competition_lift: true,
            parent_lift_id: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn training_max(repos: &Repos, user_id: Uuid, lift_id: Uuid, value: f64) {
    let now = Utc::now();
    repos
        .lift_maxes
        .append(LiftMax {
            id: Uuid::new_v4(),
            user_id,
            lift_id,
            max_type: MaxType::TrainingMax,
            value,
            effective_date: now.date_naive(),
            created_at: now,
        })
        .await
        .unwrap();
}

pub fn percent_of_tm(percentage: f64, lookup_key: LookupKey) -> LoadStrategy {
    LoadStrategy::PercentOf {
        reference: MaxType::TrainingMax,
        percentage,
        rounding: Rounding::default(),
        lookup_key,
    }
}

pub async fn prescription(
    repos: &Repos,
    lift_id: Uuid,
    load_strategy: LoadStrategy,
    set_scheme: SetScheme,
    order: i32,
) -> Prescription {
    let now = Utc::now();
    repos
        .prescriptions
        .create(Prescription {
            id: Uuid::new_v4(),
            lift_id,
            load_strategy,
            set_scheme,
            order,
            notes: None,
            rest_seconds: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn day_with_prescriptions(
    repos: &Repos,
    name: &str,
    slug: &str,
    prescription_ids: &[Uuid],
) -> Day {
    let now = Utc::now();
    let day = repos
        .days
        .create(Day {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            metadata: None,
            program_id: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    let entries = prescription_ids
        .iter()
        .enumerate()
        .map(|(i, id)| DayPrescription {
            day_id: day.id,
            prescription_id: *id,
            order: i as i32,
        })
        .collect();
    repos.days.set_prescriptions(day.id, entries).await.unwrap();
    day
}

/// A cycle whose weeks each carry the given day lists, in order.
pub async fn cycle_of_weeks(repos: &Repos, name: &str, weeks: Vec<Vec<Uuid>>) -> Cycle {
    let now = Utc::now();
    let cycle = repos
        .cycles
        .create(Cycle {
            id: Uuid::new_v4(),
            name: name.to_string(),
            length_weeks: weeks.len() as i32,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let weekday_order = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    for (i, day_ids) in weeks.into_iter().enumerate() {
        let week = repos
            .weeks
            .create(Week {
                id: Uuid::new_v4(),
                cycle_id: cycle.id,
                week_number: i as i32 + 1,
                variant: None,
            })
            .await
            .unwrap();
        let entries = day_ids
            .into_iter()
            .enumerate()
            .map(|(position, day_id)| WeekDay {
                week_id: week.id,
                day_id,
                day_of_week: weekday_order[position % weekday_order.len()],
                position: position as i32,
            })
            .collect();
        repos.weeks.set_days(week.id, entries).await.unwrap();
    }
    cycle
}

pub async fn program(
    repos: &Repos,
    name: &str,
    slug: &str,
    cycle_id: Uuid,
    weekly_lookup_id: Option<Uuid>,
    daily_lookup_id: Option<Uuid>,
) -> Program {
    let now = Utc::now();
    repos
        .programs
        .create(Program {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            cycle_id,
            weekly_lookup_id,
            daily_lookup_id,
            rotation_lookup_id: None,
            default_rounding: Rounding::default(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn progression(
    repos: &Repos,
    name: &str,
    trigger_type: TriggerType,
    max_type: MaxType,
    params: ProgressionParams,
) -> Progression {
    let now = Utc::now();
    repos
        .progressions
        .create(Progression {
            id: Uuid::new_v4(),
            name: name.to_string(),
            trigger_type,
            max_type,
            params,
            state: ProgressionState::default(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn link_progression(
    repos: &Repos,
    program_id: Uuid,
    progression_id: Uuid,
    lift_id: Uuid,
    priority: i32,
) {
    repos
        .program_progressions
        .link(ProgramProgression {
            id: Uuid::new_v4(),
            program_id,
            progression_id,
            lift_id,
            priority,
            enabled: true,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}
