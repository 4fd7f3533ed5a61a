use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::engine::generator::{self, DayPlan, PlanSnapshot, WeekPlan};
use crate::engine::load::MaxIndex;
use crate::models::{
    EnrollmentStatus, LoadStrategy, Prescription, ProgressionParams, ResolvedWorkout,
    UserProgramState,
};
use crate::repos::Repos;

use super::error::{ServiceError, ServiceResult};

/// Optional generation overrides: a preview pins week and day without
/// touching the stored position.
#[derive(Debug, Clone, Default)]
pub struct WorkoutQuery {
    pub date: Option<NaiveDate>,
    pub week: Option<i32>,
    pub day_slug: Option<String>,
}

/// Read-only end of the engine: assembles a plan snapshot from the
/// repositories and hands it to the pure generator.
#[derive(Clone)]
pub struct WorkoutService {
    repos: Repos,
}

impl WorkoutService {
    pub fn new(repos: Repos) -> Self {
        Self { repos }
    }

    pub async fn generate(
        &self,
        user_id: Uuid,
        query: WorkoutQuery,
    ) -> ServiceResult<ResolvedWorkout> {
        let state = self
            .repos
            .user_states
            .get_for_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program state", user_id))?;
        if state.enrollment_status != EnrollmentStatus::Active {
            return Err(ServiceError::Precondition(
                "enrollment is not active".to_string(),
            ));
        }

        // Overrides act on a scratch copy; generation never writes state.
        let mut view = state.clone();
        if let Some(week) = query.week {
            view.current_week = week;
            view.current_day_index = None;
        }

        let snapshot = self.assemble_snapshot(&view).await?;

        if let Some(slug) = &query.day_slug {
            let index = snapshot
                .week
                .days
                .iter()
                .position(|d| d.day.slug.eq_ignore_ascii_case(slug))
                .ok_or_else(|| ServiceError::not_found("day", slug.clone()))?;
            view.current_day_index = Some(index as i32);
        }

        let maxes = self.max_index_for(&view, &snapshot).await?;
        let stage_indexes = self.stage_indexes_for(&snapshot).await?;
        let date = query.date.unwrap_or_else(|| chrono::Utc::now().date_naive());

        debug!(user_id = %user_id, week = view.current_week, "generating workout");
        Ok(generator::generate(
            &snapshot,
            &view,
            &maxes,
            &stage_indexes,
            date,
        )?)
    }

    /// Everything the generator needs for the state's current week, in one
    /// pass over the repositories.
    pub(crate) async fn assemble_snapshot(
        &self,
        state: &UserProgramState,
    ) -> ServiceResult<PlanSnapshot> {
        let program = self
            .repos
            .programs
            .get(state.program_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program", state.program_id))?;
        let cycle = self
            .repos
            .cycles
            .get(program.cycle_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cycle", program.cycle_id))?;

        let weeks = self.repos.weeks.list_for_cycle(cycle.id).await?;
        let week = weeks
            .iter()
            .find(|w| w.week_number == state.current_week)
            .cloned()
            .ok_or_else(|| {
                ServiceError::Precondition(format!("cycle has no week {}", state.current_week))
            })?;

        let mut days = Vec::new();
        let mut lift_ids = Vec::new();
        for week_day in self.repos.weeks.days_for(week.id).await? {
            let day = self
                .repos
                .days
                .get(week_day.day_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("day", week_day.day_id))?;
            let links = self.repos.days.prescriptions_for(day.id).await?;
            let ids: Vec<Uuid> = links.iter().map(|l| l.prescription_id).collect();
            let fetched = self.repos.prescriptions.get_many(&ids).await?;
            let by_id: HashMap<Uuid, Prescription> =
                fetched.into_iter().map(|p| (p.id, p)).collect();
            // The link order is authoritative; the fetch is not.
            let mut prescriptions = Vec::with_capacity(ids.len());
            for id in &ids {
                let prescription = by_id
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("prescription", *id))?;
                lift_ids.push(prescription.lift_id);
                prescriptions.push(prescription);
            }
            days.push(DayPlan { day, prescriptions });
        }

        let mut lifts = HashMap::new();
        for lift_id in lift_ids {
            if lifts.contains_key(&lift_id) {
                continue;
            }
            let lift = self
                .repos
                .lifts
                .get(lift_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("lift", lift_id))?;
            lifts.insert(lift_id, lift);
        }

        let weekly = match program.weekly_lookup_id {
            Some(id) => self.repos.lookups.get_weekly(id).await?,
            None => None,
        };
        let daily = match program.daily_lookup_id {
            Some(id) => self.repos.lookups.get_daily(id).await?,
            None => None,
        };
        let rotation = match program.rotation_lookup_id {
            Some(id) => self.repos.lookups.get_rotation(id).await?,
            None => None,
        };

        Ok(PlanSnapshot {
            program,
            cycle,
            week: WeekPlan { week, days },
            lifts,
            weekly,
            daily,
            rotation,
        })
    }

    /// Current maxes for every percent-of strategy in the snapshot's week.
    async fn max_index_for(
        &self,
        state: &UserProgramState,
        snapshot: &PlanSnapshot,
    ) -> ServiceResult<MaxIndex> {
        let mut index = MaxIndex::new();
        let mut seen = std::collections::HashSet::new();
        for day in &snapshot.week.days {
            for prescription in &day.prescriptions {
                if let LoadStrategy::PercentOf { reference, .. } = &prescription.load_strategy {
                    if !seen.insert((prescription.lift_id, *reference)) {
                        continue;
                    }
                    if let Some(max) = self
                        .repos
                        .lift_maxes
                        .current(state.user_id, prescription.lift_id, *reference)
                        .await?
                    {
                        index.insert(prescription.lift_id, *reference, max.value);
                    }
                }
            }
        }
        Ok(index)
    }

    /// Live stage index per lift, read from the program's stage
    /// progressions.
    async fn stage_indexes_for(
        &self,
        snapshot: &PlanSnapshot,
    ) -> ServiceResult<HashMap<Uuid, u32>> {
        let mut indexes = HashMap::new();
        let links = self
            .repos
            .program_progressions
            .list_for_program(snapshot.program.id)
            .await?;
        for link in links.into_iter().filter(|l| l.enabled) {
            let Some(progression) = self.repos.progressions.get(link.progression_id).await? else {
                continue;
            };
            if matches!(progression.params, ProgressionParams::Stage { .. }) {
                indexes.insert(link.lift_id, progression.state.stage_index);
            }
        }
        Ok(indexes)
    }
}
