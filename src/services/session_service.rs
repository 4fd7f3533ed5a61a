use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    CreateSetRecord, SessionStatus, SetRecord, StartSessionRequest, TriggerType, UserProgramState,
    WorkoutSession,
};
use crate::repos::Repos;

use super::error::{ServiceError, ServiceResult};
use super::locks::UserLocks;
use super::progression_service::{ProgressionReport, ProgressionService, TriggerEvent};

/// Session log: what was actually performed. Writing a set fires AFTER_SET;
/// completing a session fires AFTER_SESSION.
#[derive(Clone)]
pub struct SessionService {
    repos: Repos,
    locks: UserLocks,
    progressions: ProgressionService,
}

impl SessionService {
    pub fn new(repos: Repos, locks: UserLocks, progressions: ProgressionService) -> Self {
        Self {
            repos,
            locks,
            progressions,
        }
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        request: StartSessionRequest,
    ) -> ServiceResult<WorkoutSession> {
        let state = self.require_state_for_user(user_id).await?;
        let session = WorkoutSession {
            id: Uuid::new_v4(),
            user_program_state_id: state.id,
            week_number: request.week_number.unwrap_or(state.current_week),
            day_index: request
                .day_index
                .or(state.current_day_index)
                .unwrap_or(0),
            status: SessionStatus::InProgress,
            started_at: Utc::now(),
            finished_at: None,
        };
        let session = self.repos.sessions.create(session).await?;
        info!(user_id = %user_id, session_id = %session.id, "session started");
        Ok(session)
    }

    pub async fn get(&self, session_id: Uuid) -> ServiceResult<(WorkoutSession, Vec<SetRecord>)> {
        let session = self.require_session(session_id).await?;
        let sets = self.repos.sessions.sets_for_session(session_id).await?;
        Ok((session, sets))
    }

    /// Log one performed set and fan the AFTER_SET event out.
    pub async fn log_set(
        &self,
        session_id: Uuid,
        request: CreateSetRecord,
    ) -> ServiceResult<(SetRecord, Vec<ProgressionReport>)> {
        let report = request.validate();
        if !report.valid() {
            return Err(ServiceError::validation(report));
        }

        let session = self.require_session(session_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(ServiceError::Precondition(format!(
                "session is {}, not in progress",
                session.status.as_str()
            )));
        }
        let state = self.require_state(session.user_program_state_id).await?;

        let lock = self.locks.for_user(state.user_id);
        let _guard = lock.lock().await;

        let set = SetRecord {
            id: Uuid::new_v4(),
            session_id,
            prescription_id: request.prescription_id,
            lift_id: request.lift_id,
            set_number: request.set_number,
            weight: request.weight,
            target_reps: request.target_reps,
            reps_performed: request.reps_performed,
            is_amrap: request.is_amrap,
            logged_at: Utc::now(),
        };
        let set = self.repos.sessions.add_set(set).await?;

        let mut event = TriggerEvent::new(TriggerType::AfterSet, session.week_number, set.logged_at);
        event.triggering_set = Some(set.clone());
        event.sets = vec![set.clone()];
        let reports = self.progressions.dispatch_unlocked(&state, &event).await?;

        Ok((set, reports))
    }

    /// Close out a session and fan the AFTER_SESSION event out over its
    /// logged sets.
    pub async fn complete(
        &self,
        session_id: Uuid,
    ) -> ServiceResult<(WorkoutSession, Vec<ProgressionReport>)> {
        let session = self.require_session(session_id).await?;
        match session.status {
            SessionStatus::InProgress => {}
            SessionStatus::Completed => {
                return Err(ServiceError::Precondition(
                    "session is already completed".to_string(),
                ))
            }
            SessionStatus::Abandoned => {
                return Err(ServiceError::Precondition(
                    "session was abandoned".to_string(),
                ))
            }
        }
        let state = self.require_state(session.user_program_state_id).await?;

        let lock = self.locks.for_user(state.user_id);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let session = self
            .repos
            .sessions
            .set_status(session_id, SessionStatus::Completed, Some(now))
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id))?;

        let mut event = TriggerEvent::new(TriggerType::AfterSession, session.week_number, now);
        event.sets = self.repos.sessions.sets_for_session(session_id).await?;
        let reports = self.progressions.dispatch_unlocked(&state, &event).await?;

        info!(session_id = %session_id, "session completed");
        Ok((session, reports))
    }

    pub async fn abandon(&self, session_id: Uuid) -> ServiceResult<WorkoutSession> {
        let session = self.require_session(session_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(ServiceError::Precondition(format!(
                "session is {}, not in progress",
                session.status.as_str()
            )));
        }
        self.repos
            .sessions
            .set_status(session_id, SessionStatus::Abandoned, Some(Utc::now()))
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id))
    }

    async fn require_session(&self, session_id: Uuid) -> ServiceResult<WorkoutSession> {
        self.repos
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id))
    }

    async fn require_state(&self, state_id: Uuid) -> ServiceResult<UserProgramState> {
        self.repos
            .user_states
            .get(state_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program state", state_id))
    }

    async fn require_state_for_user(&self, user_id: Uuid) -> ServiceResult<UserProgramState> {
        self.repos
            .user_states
            .get_for_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program state", user_id))
    }
}
