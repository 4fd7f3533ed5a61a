use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Cycle, DailyLookup, Day, DayPrescription, Lift, LiftMax, MaxType, Prescription, Program,
    ProgramProgression, Progression, RotationLookup, SessionStatus, SetRecord, UserProgramState,
    Week, WeekDay, WeeklyLookup, WorkoutSession,
};

use super::{
    CycleRepo, DayRepo, LiftMaxRepo, LiftRepo, LookupRepo, PrescriptionRepo, ProgramProgressionRepo,
    ProgramRepo, ProgressionEffect, ProgressionRepo, SessionRepo, UserProgramStateRepo, WeekRepo,
};

#[derive(Default)]
struct Inner {
    lifts: HashMap<Uuid, Lift>,
    lift_maxes: Vec<LiftMax>,
    prescriptions: HashMap<Uuid, Prescription>,
    days: HashMap<Uuid, Day>,
    day_prescriptions: HashMap<Uuid, Vec<DayPrescription>>,
    weeks: HashMap<Uuid, Week>,
    week_days: HashMap<Uuid, Vec<WeekDay>>,
    cycles: HashMap<Uuid, Cycle>,
    programs: HashMap<Uuid, Program>,
    weekly_lookups: HashMap<Uuid, WeeklyLookup>,
    daily_lookups: HashMap<Uuid, DailyLookup>,
    rotation_lookups: HashMap<Uuid, RotationLookup>,
    progressions: HashMap<Uuid, Progression>,
    program_progressions: HashMap<Uuid, ProgramProgression>,
    user_states: HashMap<Uuid, UserProgramState>,
    sessions: HashMap<Uuid, WorkoutSession>,
    set_records: Vec<SetRecord>,
}

/// All repository contracts over a single in-process map, guarded by one
/// lock so composite writes (event effects) are atomic the same way a
/// database transaction is.
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiftRepo for MemStore {
    async fn create(&self, lift: Lift) -> Result<Lift> {
        self.write().lifts.insert(lift.id, lift.clone());
        Ok(lift)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Lift>> {
        Ok(self.read().lifts.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Lift>> {
        Ok(self.read().lifts.values().find(|l| l.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Lift>> {
        let mut lifts: Vec<Lift> = self.read().lifts.values().cloned().collect();
        lifts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lifts)
    }

    async fn update(&self, lift: Lift) -> Result<Option<Lift>> {
        let mut inner = self.write();
        if !inner.lifts.contains_key(&lift.id) {
            return Ok(None);
        }
        inner.lifts.insert(lift.id, lift.clone());
        Ok(Some(lift))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().lifts.remove(&id).is_some())
    }
}

fn max_ordering(a: &LiftMax, b: &LiftMax) -> std::cmp::Ordering {
    a.effective_date
        .cmp(&b.effective_date)
        .then(a.created_at.cmp(&b.created_at))
}

#[async_trait]
impl LiftMaxRepo for MemStore {
    async fn append(&self, max: LiftMax) -> Result<LiftMax> {
        self.write().lift_maxes.push(max.clone());
        Ok(max)
    }

    async fn current(
        &self,
        user_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
    ) -> Result<Option<LiftMax>> {
        Ok(self
            .read()
            .lift_maxes
            .iter()
            .filter(|m| m.user_id == user_id && m.lift_id == lift_id && m.max_type == max_type)
            .max_by(|a, b| max_ordering(a, b))
            .cloned())
    }

    async fn history(
        &self,
        user_id: Uuid,
        lift_id: Option<Uuid>,
        max_type: Option<MaxType>,
    ) -> Result<Vec<LiftMax>> {
        let mut rows: Vec<LiftMax> = self
            .read()
            .lift_maxes
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter(|m| lift_id.map_or(true, |id| m.lift_id == id))
            .filter(|m| max_type.map_or(true, |t| m.max_type == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| max_ordering(b, a));
        Ok(rows)
    }
}

#[async_trait]
impl PrescriptionRepo for MemStore {
    async fn create(&self, prescription: Prescription) -> Result<Prescription> {
        self.write()
            .prescriptions
            .insert(prescription.id, prescription.clone());
        Ok(prescription)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Prescription>> {
        Ok(self.read().prescriptions.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Prescription>> {
        let inner = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| inner.prescriptions.get(id).cloned())
            .collect())
    }

    async fn list(&self) -> Result<Vec<Prescription>> {
        let mut rows: Vec<Prescription> = self.read().prescriptions.values().cloned().collect();
        rows.sort_by_key(|p| (p.order, p.created_at));
        Ok(rows)
    }

    async fn update(&self, prescription: Prescription) -> Result<Option<Prescription>> {
        let mut inner = self.write();
        if !inner.prescriptions.contains_key(&prescription.id) {
            return Ok(None);
        }
        inner.prescriptions.insert(prescription.id, prescription.clone());
        Ok(Some(prescription))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().prescriptions.remove(&id).is_some())
    }
}

#[async_trait]
impl DayRepo for MemStore {
    async fn create(&self, day: Day) -> Result<Day> {
        self.write().days.insert(day.id, day.clone());
        Ok(day)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Day>> {
        Ok(self.read().days.get(&id).cloned())
    }

    async fn get_by_slug(&self, program_id: Option<Uuid>, slug: &str) -> Result<Option<Day>> {
        Ok(self
            .read()
            .days
            .values()
            .find(|d| d.slug == slug && d.program_id == program_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Day>> {
        let mut days: Vec<Day> = self.read().days.values().cloned().collect();
        days.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(days)
    }

    async fn update(&self, day: Day) -> Result<Option<Day>> {
        let mut inner = self.write();
        if !inner.days.contains_key(&day.id) {
            return Ok(None);
        }
        inner.days.insert(day.id, day.clone());
        Ok(Some(day))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.write();
        inner.day_prescriptions.remove(&id);
        Ok(inner.days.remove(&id).is_some())
    }

    async fn set_prescriptions(&self, day_id: Uuid, mut entries: Vec<DayPrescription>) -> Result<()> {
        entries.sort_by_key(|e| e.order);
        self.write().day_prescriptions.insert(day_id, entries);
        Ok(())
    }

    async fn prescriptions_for(&self, day_id: Uuid) -> Result<Vec<DayPrescription>> {
        Ok(self
            .read()
            .day_prescriptions
            .get(&day_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl WeekRepo for MemStore {
    async fn create(&self, week: Week) -> Result<Week> {
        self.write().weeks.insert(week.id, week.clone());
        Ok(week)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Week>> {
        Ok(self.read().weeks.get(&id).cloned())
    }

    async fn list_for_cycle(&self, cycle_id: Uuid) -> Result<Vec<Week>> {
        let mut weeks: Vec<Week> = self
            .read()
            .weeks
            .values()
            .filter(|w| w.cycle_id == cycle_id)
            .cloned()
            .collect();
        weeks.sort_by_key(|w| w.week_number);
        Ok(weeks)
    }

    async fn update(&self, week: Week) -> Result<Option<Week>> {
        let mut inner = self.write();
        if !inner.weeks.contains_key(&week.id) {
            return Ok(None);
        }
        inner.weeks.insert(week.id, week.clone());
        Ok(Some(week))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.write();
        inner.week_days.remove(&id);
        Ok(inner.weeks.remove(&id).is_some())
    }

    async fn set_days(&self, week_id: Uuid, mut entries: Vec<WeekDay>) -> Result<()> {
        entries.sort_by_key(|e| e.position);
        self.write().week_days.insert(week_id, entries);
        Ok(())
    }

    async fn days_for(&self, week_id: Uuid) -> Result<Vec<WeekDay>> {
        Ok(self
            .read()
            .week_days
            .get(&week_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl CycleRepo for MemStore {
    async fn create(&self, cycle: Cycle) -> Result<Cycle> {
        self.write().cycles.insert(cycle.id, cycle.clone());
        Ok(cycle)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Cycle>> {
        Ok(self.read().cycles.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Cycle>> {
        let mut cycles: Vec<Cycle> = self.read().cycles.values().cloned().collect();
        cycles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cycles)
    }

    async fn update(&self, cycle: Cycle) -> Result<Option<Cycle>> {
        let mut inner = self.write();
        if !inner.cycles.contains_key(&cycle.id) {
            return Ok(None);
        }
        inner.cycles.insert(cycle.id, cycle.clone());
        Ok(Some(cycle))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().cycles.remove(&id).is_some())
    }
}

#[async_trait]
impl ProgramRepo for MemStore {
    async fn create(&self, program: Program) -> Result<Program> {
        self.write().programs.insert(program.id, program.clone());
        Ok(program)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Program>> {
        Ok(self.read().programs.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Program>> {
        Ok(self
            .read()
            .programs
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Program>> {
        let mut programs: Vec<Program> = self.read().programs.values().cloned().collect();
        programs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(programs)
    }

    async fn update(&self, program: Program) -> Result<Option<Program>> {
        let mut inner = self.write();
        if !inner.programs.contains_key(&program.id) {
            return Ok(None);
        }
        inner.programs.insert(program.id, program.clone());
        Ok(Some(program))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().programs.remove(&id).is_some())
    }
}

#[async_trait]
impl LookupRepo for MemStore {
    async fn create_weekly(&self, lookup: WeeklyLookup) -> Result<WeeklyLookup> {
        self.write().weekly_lookups.insert(lookup.id, lookup.clone());
        Ok(lookup)
    }

    async fn get_weekly(&self, id: Uuid) -> Result<Option<WeeklyLookup>> {
        Ok(self.read().weekly_lookups.get(&id).cloned())
    }

    async fn list_weekly(&self) -> Result<Vec<WeeklyLookup>> {
        let mut rows: Vec<WeeklyLookup> = self.read().weekly_lookups.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn update_weekly(&self, lookup: WeeklyLookup) -> Result<Option<WeeklyLookup>> {
        let mut inner = self.write();
        if !inner.weekly_lookups.contains_key(&lookup.id) {
            return Ok(None);
        }
        inner.weekly_lookups.insert(lookup.id, lookup.clone());
        Ok(Some(lookup))
    }

    async fn delete_weekly(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().weekly_lookups.remove(&id).is_some())
    }

    async fn create_daily(&self, lookup: DailyLookup) -> Result<DailyLookup> {
        self.write().daily_lookups.insert(lookup.id, lookup.clone());
        Ok(lookup)
    }

    async fn get_daily(&self, id: Uuid) -> Result<Option<DailyLookup>> {
        Ok(self.read().daily_lookups.get(&id).cloned())
    }

    async fn list_daily(&self) -> Result<Vec<DailyLookup>> {
        let mut rows: Vec<DailyLookup> = self.read().daily_lookups.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn update_daily(&self, lookup: DailyLookup) -> Result<Option<DailyLookup>> {
        let mut inner = self.write();
        if !inner.daily_lookups.contains_key(&lookup.id) {
            return Ok(None);
        }
        inner.daily_lookups.insert(lookup.id, lookup.clone());
        Ok(Some(lookup))
    }

    async fn delete_daily(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().daily_lookups.remove(&id).is_some())
    }

    async fn create_rotation(&self, lookup: RotationLookup) -> Result<RotationLookup> {
        self.write()
            .rotation_lookups
            .insert(lookup.id, lookup.clone());
        Ok(lookup)
    }

    async fn get_rotation(&self, id: Uuid) -> Result<Option<RotationLookup>> {
        Ok(self.read().rotation_lookups.get(&id).cloned())
    }

    async fn list_rotation(&self) -> Result<Vec<RotationLookup>> {
        let mut rows: Vec<RotationLookup> =
            self.read().rotation_lookups.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn update_rotation(&self, lookup: RotationLookup) -> Result<Option<RotationLookup>> {
        let mut inner = self.write();
        if !inner.rotation_lookups.contains_key(&lookup.id) {
            return Ok(None);
        }
        inner.rotation_lookups.insert(lookup.id, lookup.clone());
        Ok(Some(lookup))
    }

    async fn delete_rotation(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().rotation_lookups.remove(&id).is_some())
    }
}

#[async_trait]
impl ProgressionRepo for MemStore {
    async fn create(&self, progression: Progression) -> Result<Progression> {
        self.write()
            .progressions
            .insert(progression.id, progression.clone());
        Ok(progression)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Progression>> {
        Ok(self.read().progressions.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Progression>> {
        let mut rows: Vec<Progression> = self.read().progressions.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn update(&self, progression: Progression) -> Result<Option<Progression>> {
        let mut inner = self.write();
        if !inner.progressions.contains_key(&progression.id) {
            return Ok(None);
        }
        inner.progressions.insert(progression.id, progression.clone());
        Ok(Some(progression))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().progressions.remove(&id).is_some())
    }

    async fn commit_event_effects(&self, effects: Vec<ProgressionEffect>) -> Result<()> {
        // One write guard for the whole batch: all effects land or none do.
        let mut inner = self.write();
        for effect in effects {
            if let Some(progression) = inner.progressions.get_mut(&effect.progression_id) {
                progression.state = effect.new_state;
                progression.updated_at = Utc::now();
            }
            if let Some(max) = effect.new_max {
                inner.lift_maxes.push(max);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProgramProgressionRepo for MemStore {
    async fn link(&self, link: ProgramProgression) -> Result<ProgramProgression> {
        self.write()
            .program_progressions
            .insert(link.id, link.clone());
        Ok(link)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProgramProgression>> {
        Ok(self.read().program_progressions.get(&id).cloned())
    }

    async fn list_for_program(&self, program_id: Uuid) -> Result<Vec<ProgramProgression>> {
        let mut links: Vec<ProgramProgression> = self
            .read()
            .program_progressions
            .values()
            .filter(|l| l.program_id == program_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.created_at.cmp(&b.created_at)));
        Ok(links)
    }

    async fn update(&self, link: ProgramProgression) -> Result<Option<ProgramProgression>> {
        let mut inner = self.write();
        if !inner.program_progressions.contains_key(&link.id) {
            return Ok(None);
        }
        inner.program_progressions.insert(link.id, link.clone());
        Ok(Some(link))
    }

    async fn unlink(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().program_progressions.remove(&id).is_some())
    }
}

#[async_trait]
impl UserProgramStateRepo for MemStore {
    async fn create(&self, state: UserProgramState) -> Result<UserProgramState> {
        self.write().user_states.insert(state.id, state.clone());
        Ok(state)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserProgramState>> {
        Ok(self.read().user_states.get(&id).cloned())
    }

    async fn get_for_user(&self, user_id: Uuid) -> Result<Option<UserProgramState>> {
        Ok(self
            .read()
            .user_states
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn update(
        &self,
        state: UserProgramState,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.write();
        match inner.user_states.get(&state.id) {
            Some(existing) if existing.updated_at == expected_updated_at => {
                inner.user_states.insert(state.id, state);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write().user_states.remove(&id).is_some())
    }
}

#[async_trait]
impl SessionRepo for MemStore {
    async fn create(&self, session: WorkoutSession) -> Result<WorkoutSession> {
        self.write().sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkoutSession>> {
        Ok(self.read().sessions.get(&id).cloned())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<Option<WorkoutSession>> {
        let mut inner = self.write();
        match inner.sessions.get_mut(&id) {
            Some(session) => {
                session.status = status;
                session.finished_at = finished_at;
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn add_set(&self, set: SetRecord) -> Result<SetRecord> {
        self.write().set_records.push(set.clone());
        Ok(set)
    }

    async fn sets_for_session(&self, session_id: Uuid) -> Result<Vec<SetRecord>> {
        let mut sets: Vec<SetRecord> = self
            .read()
            .set_records
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        sets.sort_by_key(|s| (s.logged_at, s.set_number));
        Ok(sets)
    }

    async fn for_state_week(
        &self,
        user_program_state_id: Uuid,
        week_number: i32,
    ) -> Result<Vec<WorkoutSession>> {
        let mut sessions: Vec<WorkoutSession> = self
            .read()
            .sessions
            .values()
            .filter(|s| {
                s.user_program_state_id == user_program_state_id && s.week_number == week_number
            })
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }
}
