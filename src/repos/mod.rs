// Repository contracts. The engine and services consume these traits;
// entities are value objects owned by their repository, and resolution
// borrows read-only copies fetched through them.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Cycle, DailyLookup, Day, DayPrescription, Lift, LiftMax, MaxType, Prescription, Program,
    ProgramProgression, Progression, ProgressionState, RotationLookup, SessionStatus, SetRecord,
    UserProgramState, Week, WeekDay, WeeklyLookup, WorkoutSession,
};

pub use memory::MemStore;
pub use postgres::PgStore;

/// One progression's writes for a trigger event: its updated counters and,
/// when it applied, the new max row. The whole event's effects commit
/// atomically or not at all.
#[derive(Debug, Clone)]
pub struct ProgressionEffect {
    pub progression_id: Uuid,
    pub new_state: ProgressionState,
    pub new_max: Option<LiftMax>,
}

#[async_trait]
pub trait LiftRepo: Send + Sync {
    async fn create(&self, lift: Lift) -> Result<Lift>;
    async fn get(&self, id: Uuid) -> Result<Option<Lift>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Lift>>;
    async fn list(&self) -> Result<Vec<Lift>>;
    async fn update(&self, lift: Lift) -> Result<Option<Lift>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait LiftMaxRepo: Send + Sync {
    /// History is append-only; updates arrive as new rows.
    async fn append(&self, max: LiftMax) -> Result<LiftMax>;
    /// Latest row by effective date (ties: latest created).
    async fn current(
        &self,
        user_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
    ) -> Result<Option<LiftMax>>;
    async fn history(
        &self,
        user_id: Uuid,
        lift_id: Option<Uuid>,
        max_type: Option<MaxType>,
    ) -> Result<Vec<LiftMax>>;
}

#[async_trait]
pub trait PrescriptionRepo: Send + Sync {
    async fn create(&self, prescription: Prescription) -> Result<Prescription>;
    async fn get(&self, id: Uuid) -> Result<Option<Prescription>>;
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Prescription>>;
    async fn list(&self) -> Result<Vec<Prescription>>;
    async fn update(&self, prescription: Prescription) -> Result<Option<Prescription>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait DayRepo: Send + Sync {
    async fn create(&self, day: Day) -> Result<Day>;
    async fn get(&self, id: Uuid) -> Result<Option<Day>>;
    async fn get_by_slug(&self, program_id: Option<Uuid>, slug: &str) -> Result<Option<Day>>;
    async fn list(&self) -> Result<Vec<Day>>;
    async fn update(&self, day: Day) -> Result<Option<Day>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Replace the day's ordered prescription list.
    async fn set_prescriptions(&self, day_id: Uuid, entries: Vec<DayPrescription>) -> Result<()>;
    /// Ascending by order.
    async fn prescriptions_for(&self, day_id: Uuid) -> Result<Vec<DayPrescription>>;
}

#[async_trait]
pub trait WeekRepo: Send + Sync {
    async fn create(&self, week: Week) -> Result<Week>;
    async fn get(&self, id: Uuid) -> Result<Option<Week>>;
    /// Ascending by week number.
    async fn list_for_cycle(&self, cycle_id: Uuid) -> Result<Vec<Week>>;
    async fn update(&self, week: Week) -> Result<Option<Week>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Replace the week's ordered day list.
    async fn set_days(&self, week_id: Uuid, entries: Vec<WeekDay>) -> Result<()>;
    /// Ascending by position.
    async fn days_for(&self, week_id: Uuid) -> Result<Vec<WeekDay>>;
}

#[async_trait]
pub trait CycleRepo: Send + Sync {
    async fn create(&self, cycle: Cycle) -> Result<Cycle>;
    async fn get(&self, id: Uuid) -> Result<Option<Cycle>>;
    async fn list(&self) -> Result<Vec<Cycle>>;
    async fn update(&self, cycle: Cycle) -> Result<Option<Cycle>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ProgramRepo: Send + Sync {
    async fn create(&self, program: Program) -> Result<Program>;
    async fn get(&self, id: Uuid) -> Result<Option<Program>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Program>>;
    async fn list(&self) -> Result<Vec<Program>>;
    async fn update(&self, program: Program) -> Result<Option<Program>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait LookupRepo: Send + Sync {
    async fn create_weekly(&self, lookup: WeeklyLookup) -> Result<WeeklyLookup>;
    async fn get_weekly(&self, id: Uuid) -> Result<Option<WeeklyLookup>>;
    async fn list_weekly(&self) -> Result<Vec<WeeklyLookup>>;
    async fn update_weekly(&self, lookup: WeeklyLookup) -> Result<Option<WeeklyLookup>>;
    async fn delete_weekly(&self, id: Uuid) -> Result<bool>;

    async fn create_daily(&self, lookup: DailyLookup) -> Result<DailyLookup>;
    async fn get_daily(&self, id: Uuid) -> Result<Option<DailyLookup>>;
    async fn list_daily(&self) -> Result<Vec<DailyLookup>>;
    async fn update_daily(&self, lookup: DailyLookup) -> Result<Option<DailyLookup>>;
    async fn delete_daily(&self, id: Uuid) -> Result<bool>;

    async fn create_rotation(&self, lookup: RotationLookup) -> Result<RotationLookup>;
    async fn get_rotation(&self, id: Uuid) -> Result<Option<RotationLookup>>;
    async fn list_rotation(&self) -> Result<Vec<RotationLookup>>;
    async fn update_rotation(&self, lookup: RotationLookup) -> Result<Option<RotationLookup>>;
    async fn delete_rotation(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ProgressionRepo: Send + Sync {
    async fn create(&self, progression: Progression) -> Result<Progression>;
    async fn get(&self, id: Uuid) -> Result<Option<Progression>>;
    async fn list(&self) -> Result<Vec<Progression>>;
    async fn update(&self, progression: Progression) -> Result<Option<Progression>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Commit every effect of one trigger event in a single transaction.
    async fn commit_event_effects(&self, effects: Vec<ProgressionEffect>) -> Result<()>;
}

#[async_trait]
pub trait ProgramProgressionRepo: Send + Sync {
    async fn link(&self, link: ProgramProgression) -> Result<ProgramProgression>;
    async fn get(&self, id: Uuid) -> Result<Option<ProgramProgression>>;
    /// Ordered by priority ascending, then creation time (the tie-break).
    async fn list_for_program(&self, program_id: Uuid) -> Result<Vec<ProgramProgression>>;
    async fn update(&self, link: ProgramProgression) -> Result<Option<ProgramProgression>>;
    async fn unlink(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserProgramStateRepo: Send + Sync {
    async fn create(&self, state: UserProgramState) -> Result<UserProgramState>;
    async fn get(&self, id: Uuid) -> Result<Option<UserProgramState>>;
    async fn get_for_user(&self, user_id: Uuid) -> Result<Option<UserProgramState>>;
    /// Guarded write: succeeds only when the stored row still carries
    /// `expected_updated_at`. A `false` return is a concurrent-update
    /// conflict for the caller to surface.
    async fn update(
        &self,
        state: UserProgramState,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn create(&self, session: WorkoutSession) -> Result<WorkoutSession>;
    async fn get(&self, id: Uuid) -> Result<Option<WorkoutSession>>;
    async fn set_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<Option<WorkoutSession>>;
    async fn add_set(&self, set: SetRecord) -> Result<SetRecord>;
    async fn sets_for_session(&self, session_id: Uuid) -> Result<Vec<SetRecord>>;
    /// Sessions a state logged within one program week, oldest first.
    async fn for_state_week(
        &self,
        user_program_state_id: Uuid,
        week_number: i32,
    ) -> Result<Vec<WorkoutSession>>;
}

/// The bundle handed to services and handlers. Cloning is cheap: each
/// field is a shared handle.
#[derive(Clone)]
pub struct Repos {
    pub lifts: Arc<dyn LiftRepo>,
    pub lift_maxes: Arc<dyn LiftMaxRepo>,
    pub prescriptions: Arc<dyn PrescriptionRepo>,
    pub days: Arc<dyn DayRepo>,
    pub weeks: Arc<dyn WeekRepo>,
    pub cycles: Arc<dyn CycleRepo>,
    pub programs: Arc<dyn ProgramRepo>,
    pub lookups: Arc<dyn LookupRepo>,
    pub progressions: Arc<dyn ProgressionRepo>,
    pub program_progressions: Arc<dyn ProgramProgressionRepo>,
    pub user_states: Arc<dyn UserProgramStateRepo>,
    pub sessions: Arc<dyn SessionRepo>,
}

impl Repos {
    /// In-memory store, used by tests and local development.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemStore::new());
        Self {
            lifts: store.clone(),
            lift_maxes: store.clone(),
            prescriptions: store.clone(),
            days: store.clone(),
            weeks: store.clone(),
            cycles: store.clone(),
            programs: store.clone(),
            lookups: store.clone(),
            progressions: store.clone(),
            program_progressions: store.clone(),
            user_states: store.clone(),
            sessions: store,
        }
    }

    /// Postgres-backed store over a shared connection pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            lifts: store.clone(),
            lift_maxes: store.clone(),
            prescriptions: store.clone(),
            days: store.clone(),
            weeks: store.clone(),
            cycles: store.clone(),
            programs: store.clone(),
            lookups: store.clone(),
            progressions: store.clone(),
            program_progressions: store.clone(),
            user_states: store.clone(),
            sessions: store,
        }
    }
}
