use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::progression::{self, ProgressionCtx};
use crate::models::{
    LiftMax, ProgressionOutcome, SetRecord, TriggerType, UserProgramState,
};
use crate::repos::{ProgressionEffect, Repos};

use super::error::{ServiceError, ServiceResult};
use super::locks::UserLocks;

/// One trigger event as delivered to the progression engine. The id tags
/// the event for idempotency.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub id: Uuid,
    pub trigger: TriggerType,
    pub occurred_at: DateTime<Utc>,
    /// The program week the event belongs to (for weekly events, the week
    /// that just finished).
    pub week_number: i32,
    /// The set that fired an AFTER_SET event.
    pub triggering_set: Option<SetRecord>,
    /// Sets in the event's scope (the session's or the week's).
    pub sets: Vec<SetRecord>,
}

impl TriggerEvent {
    pub fn new(trigger: TriggerType, week_number: i32, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger,
            occurred_at,
            week_number,
            triggering_set: None,
            sets: Vec::new(),
        }
    }
}

/// What one progression did with an event, surfaced to the API caller.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressionReport {
    pub progression_id: Uuid,
    pub progression_name: String,
    pub lift_id: Uuid,
    pub outcome: ProgressionOutcome,
}

/// Manual trigger request body.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerRequest {
    pub trigger_type: TriggerType,
    pub week_number: Option<i32>,
    /// Scope for set-backed triggers; required for AFTER_SET and
    /// AFTER_SESSION.
    pub session_id: Option<Uuid>,
}

/// Fans trigger events out to a program's enabled progressions and commits
/// their effects atomically.
#[derive(Clone)]
pub struct ProgressionService {
    repos: Repos,
    locks: UserLocks,
}

impl ProgressionService {
    pub fn new(repos: Repos, locks: UserLocks) -> Self {
        Self { repos, locks }
    }

    /// Manual trigger endpoint: build an event from the request scope and
    /// dispatch it under the user lock.
    pub async fn trigger(
        &self,
        user_id: Uuid,
        request: TriggerRequest,
    ) -> ServiceResult<Vec<ProgressionReport>> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let state = self.require_state(user_id).await?;
        let week = request.week_number.unwrap_or(state.current_week);
        let mut event = TriggerEvent::new(request.trigger_type, week, Utc::now());

        match request.trigger_type {
            TriggerType::AfterSet | TriggerType::AfterSession => {
                let session_id = request.session_id.ok_or_else(|| {
                    ServiceError::invalid("session_id", "set and session triggers need a session")
                })?;
                let sets = self.repos.sessions.sets_for_session(session_id).await?;
                if request.trigger_type == TriggerType::AfterSet {
                    event.triggering_set = sets
                        .iter()
                        .filter(|s| s.is_amrap)
                        .max_by_key(|s| s.logged_at)
                        .cloned();
                }
                event.sets = sets;
            }
            TriggerType::AfterWeek => {
                event.sets = self.sets_for_week(&state, week).await?;
            }
            TriggerType::AfterCycle => {}
        }

        self.dispatch_unlocked(&state, &event).await
    }

    /// All sets the state logged during one program week.
    pub(crate) async fn sets_for_week(
        &self,
        state: &UserProgramState,
        week_number: i32,
    ) -> ServiceResult<Vec<SetRecord>> {
        let sessions = self
            .repos
            .sessions
            .for_state_week(state.id, week_number)
            .await?;
        let mut sets = Vec::new();
        for session in sessions {
            sets.extend(self.repos.sessions.sets_for_session(session.id).await?);
        }
        Ok(sets)
    }

    /// Dispatch one event. The caller must already hold the user's lock;
    /// every write lands in a single `commit_event_effects` transaction.
    pub(crate) async fn dispatch_unlocked(
        &self,
        state: &UserProgramState,
        event: &TriggerEvent,
    ) -> ServiceResult<Vec<ProgressionReport>> {
        let program = self
            .repos
            .programs
            .get(state.program_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program", state.program_id))?;

        let links = self
            .repos
            .program_progressions
            .list_for_program(program.id)
            .await?;

        let mut reports = Vec::new();
        let mut effects = Vec::new();

        for link in links.into_iter().filter(|l| l.enabled) {
            let Some(progression) = self.repos.progressions.get(link.progression_id).await? else {
                warn!(progression_id = %link.progression_id, "program links a missing progression");
                continue;
            };
            if !progression::responds_to(&progression.params, progression.trigger_type, event.trigger)
            {
                continue;
            }
            // A set event belongs to one lift; other links stay silent.
            if event.trigger == TriggerType::AfterSet {
                match &event.triggering_set {
                    Some(set) if set.lift_id == link.lift_id => {}
                    _ => continue,
                }
            }

            // A misconfigured rule is reported and skipped; the rest of the
            // event still runs.
            let validation = progression::validate_params(&progression.params);
            if !validation.valid() {
                reports.push(ProgressionReport {
                    progression_id: progression.id,
                    progression_name: progression.name.clone(),
                    lift_id: link.lift_id,
                    outcome: ProgressionOutcome::unchanged(0.0, "progression parameters are invalid"),
                });
                continue;
            }

            let Some(current) = self
                .repos
                .lift_maxes
                .current(state.user_id, link.lift_id, progression.max_type)
                .await?
            else {
                reports.push(ProgressionReport {
                    progression_id: progression.id,
                    progression_name: progression.name.clone(),
                    lift_id: link.lift_id,
                    outcome: ProgressionOutcome::unchanged(
                        0.0,
                        format!("no current {} for this lift", progression.max_type),
                    ),
                });
                continue;
            };

            let lift_sets: Vec<SetRecord> = event
                .sets
                .iter()
                .filter(|s| s.lift_id == link.lift_id)
                .cloned()
                .collect();
            let ctx = ProgressionCtx {
                event_id: event.id,
                trigger: event.trigger,
                current_value: current.value,
                rounding: program.default_rounding,
                triggering_set: event
                    .triggering_set
                    .as_ref()
                    .filter(|s| s.lift_id == link.lift_id),
                lift_sets: &lift_sets,
                week_number: event.week_number,
            };

            let mut rule_state = progression.state.clone();
            // A computational failure aborts the whole event before any
            // effect commits.
            let outcome = progression::apply(&progression.params, &mut rule_state, &ctx)?;

            let new_max = (outcome.applied && outcome.new_value != outcome.previous_value).then(|| {
                LiftMax {
                    id: Uuid::new_v4(),
                    user_id: state.user_id,
                    lift_id: link.lift_id,
                    max_type: progression.max_type,
                    value: outcome.new_value,
                    effective_date: event.occurred_at.date_naive(),
                    created_at: event.occurred_at,
                }
            });

            effects.push(ProgressionEffect {
                progression_id: progression.id,
                new_state: rule_state,
                new_max,
            });
            reports.push(ProgressionReport {
                progression_id: progression.id,
                progression_name: progression.name.clone(),
                lift_id: link.lift_id,
                outcome,
            });
        }

        if !effects.is_empty() {
            self.repos.progressions.commit_event_effects(effects).await?;
        }
        info!(
            user_id = %state.user_id,
            trigger = %event.trigger,
            applied = reports.iter().filter(|r| r.outcome.applied).count(),
            "progression event dispatched"
        );
        Ok(reports)
    }

    async fn require_state(&self, user_id: Uuid) -> ServiceResult<UserProgramState> {
        self.repos
            .user_states
            .get_for_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("program state", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Cycle, EnrollmentStatus, Lift, MaxType, PhaseStatus, Program, ProgramProgression,
        Progression, ProgressionParams, ProgressionState, Rounding, ScheduleType,
    };

    struct Fixture {
        service: ProgressionService,
        repos: Repos,
        state: UserProgramState,
        lift_id: Uuid,
        progression_id: Uuid,
    }

    async fn fixture(params: ProgressionParams, trigger: TriggerType, current_tm: f64) -> Fixture {
        let repos = Repos::in_memory();
        let now = Utc::now();

        let lift = Lift {
            id: Uuid::new_v4(),
            name: "Squat".to_string(),
            slug: "squat".to_string(),
            is_competition_lift: true,
            parent_lift_id: None,
            created_at: now,
            updated_at: now,
        };
        repos.lifts.create(lift.clone()).await.unwrap();

        let cycle = Cycle {
            id: Uuid::new_v4(),
            name: "base".to_string(),
            length_weeks: 1,
            created_at: now,
            updated_at: now,
        };
        repos.cycles.create(cycle.clone()).await.unwrap();

        let program = Program {
            id: Uuid::new_v4(),
            name: "Texas Method".to_string(),
            slug: "texas-method".to_string(),
            description: None,
            cycle_id: cycle.id,
            weekly_lookup_id: None,
            daily_lookup_id: None,
            rotation_lookup_id: None,
            default_rounding: Rounding::default(),
            created_at: now,
            updated_at: now,
        };
        repos.programs.create(program.clone()).await.unwrap();

        let progression = Progression {
            id: Uuid::new_v4(),
            name: "test rule".to_string(),
            trigger_type: trigger,
            max_type: MaxType::TrainingMax,
            params,
            state: ProgressionState::default(),
            created_at: now,
            updated_at: now,
        };
        repos.progressions.create(progression.clone()).await.unwrap();

        repos
            .program_progressions
            .link(ProgramProgression {
                id: Uuid::new_v4(),
                program_id: program.id,
                progression_id: progression.id,
                lift_id: lift.id,
                priority: 0,
                enabled: true,
                created_at: now,
            })
            .await
            .unwrap();

        let user_id = Uuid::new_v4();
        repos
            .lift_maxes
            .append(LiftMax {
                id: Uuid::new_v4(),
                user_id,
                lift_id: lift.id,
                max_type: MaxType::TrainingMax,
                value: current_tm,
                effective_date: now.date_naive(),
                created_at: now,
            })
            .await
            .unwrap();

        let state = UserProgramState {
            id: Uuid::new_v4(),
            user_id,
            program_id: program.id,
            current_week: 1,
            current_cycle_iteration: 1,
            current_day_index: Some(0),
            rotation_position: 0,
            cycles_since_start: 0,
            meet_date: None,
            schedule_type: ScheduleType::Rotation,
            enrollment_status: EnrollmentStatus::Active,
            cycle_status: PhaseStatus::InProgress,
            week_status: PhaseStatus::InProgress,
            enrolled_at: now,
            updated_at: now,
        };
        repos.user_states.create(state.clone()).await.unwrap();

        Fixture {
            service: ProgressionService::new(repos.clone(), UserLocks::new()),
            repos,
            state,
            lift_id: lift.id,
            progression_id: progression.id,
        }
    }

    #[tokio::test]
    async fn applied_event_appends_a_new_max_row() {
        let fx = fixture(
            ProgressionParams::Linear { increment: 5.0 },
            TriggerType::AfterSession,
            315.0,
        )
        .await;

        let event = TriggerEvent::new(TriggerType::AfterSession, 1, Utc::now());
        let reports = fx.service.dispatch_unlocked(&fx.state, &event).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].outcome.applied);

        let current = fx
            .repos
            .lift_maxes
            .current(fx.state.user_id, fx.lift_id, MaxType::TrainingMax)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.value, 320.0);
    }

    #[tokio::test]
    async fn redelivering_the_same_event_is_a_no_op() {
        let fx = fixture(
            ProgressionParams::Linear { increment: 5.0 },
            TriggerType::AfterSession,
            315.0,
        )
        .await;

        let event = TriggerEvent::new(TriggerType::AfterSession, 1, Utc::now());
        fx.service.dispatch_unlocked(&fx.state, &event).await.unwrap();
        let reports = fx.service.dispatch_unlocked(&fx.state, &event).await.unwrap();
        assert!(!reports[0].outcome.applied);

        let current = fx
            .repos
            .lift_maxes
            .current(fx.state.user_id, fx.lift_id, MaxType::TrainingMax)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.value, 320.0);
    }

    #[tokio::test]
    async fn mismatched_trigger_is_ignored() {
        let fx = fixture(
            ProgressionParams::Cycle { increment: 10.0 },
            TriggerType::AfterCycle,
            315.0,
        )
        .await;

        let event = TriggerEvent::new(TriggerType::AfterSession, 1, Utc::now());
        let reports = fx.service.dispatch_unlocked(&fx.state, &event).await.unwrap();
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn missing_max_reports_not_applicable_without_failing() {
        let fx = fixture(
            ProgressionParams::Linear { increment: 5.0 },
            TriggerType::AfterSession,
            315.0,
        )
        .await;
        // Point the link at a lift with no max on file.
        let other_lift = Lift {
            id: Uuid::new_v4(),
            name: "Press".to_string(),
            slug: "press".to_string(),
            is_competition_lift: false,
            parent_lift_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        fx.repos.lifts.create(other_lift.clone()).await.unwrap();
        fx.repos
            .program_progressions
            .link(ProgramProgression {
                id: Uuid::new_v4(),
                program_id: fx.state.program_id,
                progression_id: fx.progression_id,
                lift_id: other_lift.id,
                priority: 1,
                enabled: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let event = TriggerEvent::new(TriggerType::AfterSession, 1, Utc::now());
        let reports = fx.service.dispatch_unlocked(&fx.state, &event).await.unwrap();
        assert_eq!(reports.len(), 2);
        let not_applied = reports.iter().find(|r| r.lift_id == other_lift.id).unwrap();
        assert!(!not_applied.outcome.applied);
        assert!(not_applied
            .outcome
            .reason
            .as_deref()
            .unwrap()
            .contains("no current"));
    }
}
