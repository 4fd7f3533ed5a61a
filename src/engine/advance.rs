use chrono::{DateTime, Utc};

use crate::models::{PhaseStatus, UserProgramState, WeekVariant};

use super::EngineError;

/// What one advancement produced. The input state is untouched; callers
/// persist `state` and fan out the trigger events the flags describe.
#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    pub state: UserProgramState,
    /// The canonical AFTER_CYCLE signal; fires exactly once per full pass.
    pub cycle_completed: bool,
    /// True when the week rolled over (including on cycle completion).
    pub week_completed: bool,
}

/// Move a user's position forward by one training day. Advancement is the
/// only writer of position fields; rotation position moves once per
/// completed cycle, modulo the rotation table length.
pub fn advance(
    state: &UserProgramState,
    days_in_week: usize,
    cycle_length_weeks: i32,
    rotation_len: usize,
    now: DateTime<Utc>,
) -> Result<AdvanceOutcome, EngineError> {
    if days_in_week == 0 {
        return Err(EngineError::EmptyWeek {
            week_number: state.current_week,
        });
    }

    let mut next = state.clone();
    let mut cycle_completed = false;
    let mut week_completed = false;

    let mut day = state.current_day_index.unwrap_or(0) + 1;
    if day >= days_in_week as i32 {
        day = 0;
        week_completed = true;
        next.current_week += 1;
        if next.current_week > cycle_length_weeks {
            next.current_week = 1;
            next.current_cycle_iteration += 1;
            next.cycles_since_start += 1;
            cycle_completed = true;
            if rotation_len > 0 {
                next.rotation_position = (state.rotation_position + 1) % rotation_len as i32;
            }
        }
    }
    next.current_day_index = Some(day);

    next.week_status = if week_completed {
        PhaseStatus::Pending
    } else {
        PhaseStatus::InProgress
    };
    next.cycle_status = if cycle_completed {
        PhaseStatus::Pending
    } else {
        PhaseStatus::InProgress
    };
    next.updated_at = now;

    Ok(AdvanceOutcome {
        state: next,
        cycle_completed,
        week_completed,
    })
}

/// A/B template for programs that alternate three-day weeks: variant A
/// when the week parity matches the day-position parity. Day positions are
/// 1-based. Deterministic, so weeks need not store a variant per day.
pub fn week_variant(week_number: i32, day_position: i32) -> WeekVariant {
    if week_number.rem_euclid(2) == day_position.rem_euclid(2) {
        WeekVariant::A
    } else {
        WeekVariant::B
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrollmentStatus, ScheduleType};
    use uuid::Uuid;

    fn fresh_state() -> UserProgramState {
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
            cycle_status: PhaseStatus::InProgress,
            week_status: PhaseStatus::InProgress,
            enrolled_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn two_week_two_day_cycle_walkthrough() {
        // (week, day, iteration) trail: (1,∅) → (1,1) → (2,0) → (2,1) → (1,0) next iteration.
        let mut state = fresh_state();
        let now = Utc::now();

        let step = advance(&state, 2, 2, 0, now).unwrap();
        assert!(!step.cycle_completed);
        assert_eq!((step.state.current_week, step.state.current_day_index), (1, Some(1)));
        state = step.state;

        let step = advance(&state, 2, 2, 0, now).unwrap();
        assert!(!step.cycle_completed);
        assert_eq!((step.state.current_week, step.state.current_day_index), (2, Some(0)));
        state = step.state;

        let step = advance(&state, 2, 2, 0, now).unwrap();
        assert!(!step.cycle_completed);
        assert_eq!((step.state.current_week, step.state.current_day_index), (2, Some(1)));
        state = step.state;

        let step = advance(&state, 2, 2, 0, now).unwrap();
        assert!(step.cycle_completed);
        assert_eq!((step.state.current_week, step.state.current_day_index), (1, Some(0)));
        assert_eq!(step.state.current_cycle_iteration, 2);
        assert_eq!(step.state.cycles_since_start, 1);
    }

    #[test]
    fn full_pass_returns_to_origin_exactly_once_per_window() {
        let days = 3usize;
        let weeks = 4;
        let mut state = fresh_state();
        let now = Utc::now();
        let mut completions = 0;

        for _ in 0..days * weeks as usize {
            let step = advance(&state, days, weeks, 0, now).unwrap();
            if step.cycle_completed {
                completions += 1;
            }
            state = step.state;
        }
        assert_eq!(completions, 1);
        assert_eq!(state.current_week, 1);
        assert_eq!(state.current_day_index, Some(0));
        assert_eq!(state.cycles_since_start, 1);
    }

    #[test]
    fn input_state_is_not_mutated() {
        let state = fresh_state();
        let before = state.clone();
        let _ = advance(&state, 3, 4, 0, Utc::now()).unwrap();
        assert_eq!(state.current_week, before.current_week);
        assert_eq!(state.current_day_index, before.current_day_index);
    }

    #[test]
    fn rotation_moves_once_per_cycle_modulo_length() {
        let mut state = fresh_state();
        let now = Utc::now();
        // 1-week, 1-day cycle: every advance completes a cycle.
        for expected in [1, 2, 0, 1] {
            let step = advance(&state, 1, 1, 3, now).unwrap();
            assert!(step.cycle_completed);
            assert_eq!(step.state.rotation_position, expected);
            state = step.state;
        }
    }

    #[test]
    fn empty_week_cannot_advance() {
        let state = fresh_state();
        assert!(matches!(
            advance(&state, 0, 2, 0, Utc::now()),
            Err(EngineError::EmptyWeek { .. })
        ));
    }

    #[test]
    fn ab_variant_parity() {
        // Odd week: A on odd day positions.
        assert_eq!(week_variant(1, 1), WeekVariant::A);
        assert_eq!(week_variant(1, 2), WeekVariant::B);
        assert_eq!(week_variant(1, 3), WeekVariant::A);
        // Even week flips.
        assert_eq!(week_variant(2, 1), WeekVariant::B);
        assert_eq!(week_variant(2, 2), WeekVariant::A);
        assert_eq!(week_variant(2, 3), WeekVariant::B);
    }
}
