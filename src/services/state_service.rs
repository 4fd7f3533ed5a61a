use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::advance;
use crate::models::{
    EnrollRequest, EnrollmentStatus, PhaseStatus, ScheduleType, TriggerType, UserProgramState,
    ValidationReport,
};
use crate::repos::Repos;

use super::error::{ServiceError, ServiceResult};
use super::locks::UserLocks;
use super::progression_service::{ProgressionReport, ProgressionService, TriggerEvent};

/// What an advance produced: the persisted position plus anything the
/// week/cycle events did to the user's maxes.
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    pub state: UserProgramState,
    pub cycle_completed: bool,
    pub progression_reports: Vec<ProgressionReport>,
}

/// Enrollment and position: the only writer of the position fields.
#[derive(Clone)]
pub struct StateService {
    repos: Repos,
    locks: UserLocks,
    progressions: ProgressionService,
}

impl StateService {
    pub fn new(repos: Repos, locks: UserLocks, progressions: ProgressionService) -> Self {
        Self {
            repos,
            locks,
            progressions,
        }
    }

    pub async fn enroll(
        &self,
        user_id: Uuid,
        request: EnrollRequest,
    ) -> ServiceResult<UserProgramState> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let program = self
            .repos
            .programs
            .get(request.program_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program", request.program_id))?;

        let now = Utc::now();
        if let Some(meet_date) = request.meet_date {
            validate_meet_date(meet_date, now.date_naive())?;
        }

        if let Some(existing) = self.repos.user_states.get_for_user(user_id).await? {
            if existing.enrollment_status == EnrollmentStatus::Active {
                return Err(ServiceError::Precondition(
                    "user is already enrolled in a program".to_string(),
                ));
            }
            // A quit enrollment is replaced outright.
            self.repos.user_states.delete(existing.id).await?;
        }

        let state = UserProgramState {
            id: Uuid::new_v4(),
            user_id,
            program_id: program.id,
            current_week: 1,
            current_cycle_iteration: 1,
            current_day_index: None,
            rotation_position: 0,
            cycles_since_start: 0,
            meet_date: request.meet_date,
            schedule_type: if request.meet_date.is_some() {
                ScheduleType::DaysOut
            } else {
                ScheduleType::Rotation
            },
            enrollment_status: EnrollmentStatus::Active,
            cycle_status: PhaseStatus::Pending,
            week_status: PhaseStatus::Pending,
            enrolled_at: now,
            updated_at: now,
        };
        let state = self.repos.user_states.create(state).await?;
        info!(user_id = %user_id, program = %program.slug, "user enrolled");
        Ok(state)
    }

    pub async fn get(&self, user_id: Uuid) -> ServiceResult<UserProgramState> {
        self.require_state(user_id).await
    }

    /// Set or clear the meet date; setting switches the schedule to
    /// days-out counting, clearing reverts to rotation.
    pub async fn set_meet_date(
        &self,
        user_id: Uuid,
        meet_date: Option<NaiveDate>,
    ) -> ServiceResult<UserProgramState> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let state = self.require_state(user_id).await?;
        let now = Utc::now();
        if let Some(date) = meet_date {
            validate_meet_date(date, now.date_naive())?;
        }

        let expected = state.updated_at;
        let mut next = state;
        next.meet_date = meet_date;
        next.schedule_type = if meet_date.is_some() {
            ScheduleType::DaysOut
        } else {
            ScheduleType::Rotation
        };
        next.updated_at = now;

        if !self.repos.user_states.update(next.clone(), expected).await? {
            return Err(ServiceError::Conflict(
                "program state changed concurrently".to_string(),
            ));
        }
        Ok(next)
    }

    pub async fn quit(&self, user_id: Uuid) -> ServiceResult<UserProgramState> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let state = self.require_state(user_id).await?;
        let expected = state.updated_at;
        let mut next = state;
        next.enrollment_status = EnrollmentStatus::Quit;
        next.updated_at = Utc::now();
        if !self.repos.user_states.update(next.clone(), expected).await? {
            return Err(ServiceError::Conflict(
                "program state changed concurrently".to_string(),
            ));
        }
        info!(user_id = %user_id, "user quit program");
        Ok(next)
    }

    /// Move to the next training day and fan out the week/cycle events the
    /// rollover produced.
    pub async fn advance(&self, user_id: Uuid) -> ServiceResult<AdvanceResponse> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let state = self.require_state(user_id).await?;
        if state.enrollment_status != EnrollmentStatus::Active {
            return Err(ServiceError::Precondition(
                "enrollment is not active".to_string(),
            ));
        }

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
            .ok_or_else(|| {
                ServiceError::Precondition(format!(
                    "cycle has no week {}",
                    state.current_week
                ))
            })?;
        let days_in_week = self.repos.weeks.days_for(week.id).await?.len();

        let rotation_len = match program.rotation_lookup_id {
            Some(id) => self
                .repos
                .lookups
                .get_rotation(id)
                .await?
                .map(|r| r.entries.len())
                .unwrap_or(0),
            None => 0,
        };

        let now = Utc::now();
        let completed_week = state.current_week;
        let expected = state.updated_at;
        let outcome = advance::advance(&state, days_in_week, cycle.length_weeks, rotation_len, now)?;

        if !self
            .repos
            .user_states
            .update(outcome.state.clone(), expected)
            .await?
        {
            return Err(ServiceError::Conflict(
                "program state changed concurrently".to_string(),
            ));
        }

        let mut reports = Vec::new();
        if outcome.week_completed {
            let mut event = TriggerEvent::new(TriggerType::AfterWeek, completed_week, now);
            event.sets = self
                .progressions
                .sets_for_week(&outcome.state, completed_week)
                .await?;
            reports.extend(
                self.progressions
                    .dispatch_unlocked(&outcome.state, &event)
                    .await?,
            );
        }
        if outcome.cycle_completed {
            let event = TriggerEvent::new(TriggerType::AfterCycle, completed_week, now);
            reports.extend(
                self.progressions
                    .dispatch_unlocked(&outcome.state, &event)
                    .await?,
            );
        }

        info!(
            user_id = %user_id,
            week = outcome.state.current_week,
            day = ?outcome.state.current_day_index,
            cycle_completed = outcome.cycle_completed,
            "advanced program state"
        );
        Ok(AdvanceResponse {
            state: outcome.state,
            cycle_completed: outcome.cycle_completed,
            progression_reports: reports,
        })
    }

    async fn require_state(&self, user_id: Uuid) -> ServiceResult<UserProgramState> {
        self.repos
            .user_states
            .get_for_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program state", user_id))
    }
}

fn validate_meet_date(meet_date: NaiveDate, today: NaiveDate) -> ServiceResult<()> {
    if meet_date <= today {
        let mut report = ValidationReport::new();
        report.error("meet_date", "meet date must be strictly in the future");
        return Err(ServiceError::validation(report));
    }
    Ok(())
}
