use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// How a user's calendar maps onto the program: free rotation through the
/// cycle, or counting down to a meet date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Rotation,
    DaysOut,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Rotation => "rotation",
            ScheduleType::DaysOut => "days_out",
        }
    }
}

impl FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rotation" => Ok(ScheduleType::Rotation),
            "days_out" => Ok(ScheduleType::DaysOut),
            other => Err(format!("unknown schedule type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    BetweenCycles,
    Quit,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::BetweenCycles => "between_cycles",
            EnrollmentStatus::Quit => "quit",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "between_cycles" => Ok(EnrollmentStatus::BetweenCycles),
            "quit" => Ok(EnrollmentStatus::Quit),
            other => Err(format!("unknown enrollment status: {other}")),
        }
    }
}

/// Progress marker shared by the cycle- and week-level status fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Completed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
        }
    }
}

impl FromStr for PhaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PhaseStatus::Pending),
            "in_progress" => Ok(PhaseStatus::InProgress),
            "completed" => Ok(PhaseStatus::Completed),
            other => Err(format!("unknown phase status: {other}")),
        }
    }
}

/// A user's position within their enrolled program. Advancement is the only
/// writer of the position fields; progressions never touch them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgramState {
    pub id: Uuid,
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub current_week: i32,
    pub current_cycle_iteration: i32,
    /// `None` until the first training day of the week is generated.
    pub current_day_index: Option<i32>,
    pub rotation_position: i32,
    pub cycles_since_start: i32,
    pub meet_date: Option<NaiveDate>,
    pub schedule_type: ScheduleType,
    pub enrollment_status: EnrollmentStatus,
    pub cycle_status: PhaseStatus,
    pub week_status: PhaseStatus,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProgramState {
    /// Whole days until the meet, clamped at zero. Derived, never stored.
    pub fn days_out(&self, now: DateTime<Utc>) -> Option<i64> {
        self.meet_date.map(|meet| {
            let days = (meet - now.date_naive()).num_days();
            days.max(0)
        })
    }

    pub fn weeks_to_meet(&self, now: DateTime<Utc>) -> Option<i64> {
        self.days_out(now).map(|days| days / 7)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollRequest {
    pub program_id: Uuid,
    pub meet_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMeetDateRequest {
    /// `None` clears the meet date and reverts the schedule to rotation.
    pub meet_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state_with_meet(meet: Option<NaiveDate>) -> UserProgramState {
        UserProgramState {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            current_week: 1,
            current_cycle_iteration: 1,
            current_day_index: None,
            rotation_position: 0,
            cycles_since_start: 0,
            meet_date: meet,
            schedule_type: if meet.is_some() { ScheduleType::DaysOut } else { ScheduleType::Rotation },
            enrollment_status: EnrollmentStatus::Active,
            cycle_status: PhaseStatus::Pending,
            week_status: PhaseStatus::Pending,
            enrolled_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn days_out_is_derived_and_clamped() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let state = state_with_meet(NaiveDate::from_ymd_opt(2025, 6, 29));
        assert_eq!(state.days_out(now), Some(28));
        assert_eq!(state.weeks_to_meet(now), Some(4));

        let past = state_with_meet(NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(past.days_out(now), Some(0));
    }

    #[test]
    fn no_meet_date_no_days_out() {
        let state = state_with_meet(None);
        assert_eq!(state.days_out(Utc::now()), None);
        assert_eq!(state.weeks_to_meet(Utc::now()), None);
    }
}
