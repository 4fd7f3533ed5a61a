use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidationReport;

/// One weekly periodization entry. An entry carries either per-set
/// percentage overrides or a scalar multiplicative modifier, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLookupEntry {
    pub week_number: i32,
    /// Per-set replacement percentages; `percentages[i]` replaces the base
    /// percentage of set i+1 outright.
    pub percentages: Option<Vec<f64>>,
    /// Per-set target reps. A negative value means "at least |r|, AMRAP".
    pub reps: Option<Vec<i32>>,
    /// Scales the base percentage multiplicatively (as a percent).
    pub percentage_modifier: Option<f64>,
}

/// Weekly periodization table, keyed by week number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyLookup {
    pub id: Uuid,
    pub name: String,
    pub entries: Vec<WeeklyLookupEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyLookup {
    pub fn entry_for(&self, week_number: i32) -> Option<&WeeklyLookupEntry> {
        self.entries.iter().find(|e| e.week_number == week_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWeeklyLookup {
    pub name: String,
    pub entries: Vec<WeeklyLookupEntry>,
}

impl CreateWeeklyLookup {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.error("name", "name is required");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.week_number < 1 {
                report.error(&format!("entries[{i}].week_number"), "week number must be at least 1");
            }
            // The two modes are disjoint; rejecting both here spares the
            // resolver from guessing a precedence.
            if entry.percentages.is_some() && entry.percentage_modifier.is_some() {
                report.error(
                    &format!("entries[{i}]"),
                    "percentages and percentage_modifier are mutually exclusive",
                );
            }
            if entry.percentages.is_none()
                && entry.percentage_modifier.is_none()
                && entry.reps.is_none()
            {
                report.error(&format!("entries[{i}]"), "entry carries no data");
            }
            if let Some(percentages) = &entry.percentages {
                if percentages.iter().any(|p| *p <= 0.0) {
                    report.error(
                        &format!("entries[{i}].percentages"),
                        "percentages must be positive",
                    );
                }
            }
            if let Some(modifier) = entry.percentage_modifier {
                if modifier <= 0.0 {
                    report.error(
                        &format!("entries[{i}].percentage_modifier"),
                        "modifier must be positive",
                    );
                }
            }
        }
        report
    }
}

/// One daily entry: matches a day slug case-insensitively or a symbolic
/// intensity key ("heavy" / "light" / "medium").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLookupEntry {
    pub day_identifier: String,
    pub percentage_modifier: f64,
    pub intensity_level: Option<String>,
}

/// Daily periodization table, keyed by day identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLookup {
    pub id: Uuid,
    pub name: String,
    pub entries: Vec<DailyLookupEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyLookup {
    pub fn entry_for(&self, day_slug: &str) -> Option<&DailyLookupEntry> {
        self.entries
            .iter()
            .find(|e| e.day_identifier.eq_ignore_ascii_case(day_slug))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDailyLookup {
    pub name: String,
    pub entries: Vec<DailyLookupEntry>,
}

impl CreateDailyLookup {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.error("name", "name is required");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.day_identifier.trim().is_empty() {
                report.error(&format!("entries[{i}].day_identifier"), "identifier is required");
            }
            if entry.percentage_modifier < 0.0 {
                report.error(
                    &format!("entries[{i}].percentage_modifier"),
                    "modifier must be nonnegative",
                );
            }
        }
        report
    }
}

/// One rotation slot naming the focus lift for that exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationLookupEntry {
    pub position: i32,
    /// A lift slug; conjugate-style programs swap the focus lift each pass.
    pub lift_identifier: String,
}

/// Rotation table for programs whose focus lift cycles each exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationLookup {
    pub id: Uuid,
    pub name: String,
    pub entries: Vec<RotationLookupEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RotationLookup {
    /// Resolve a rotation position modulo the table length.
    pub fn entry_at(&self, position: i32) -> Option<&RotationLookupEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let wrapped = position.rem_euclid(self.entries.len() as i32);
        self.entries.iter().find(|e| e.position == wrapped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRotationLookup {
    pub name: String,
    pub entries: Vec<RotationLookupEntry>,
}

impl CreateRotationLookup {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.error("name", "name is required");
        }
        let mut positions: Vec<i32> = self.entries.iter().map(|e| e.position).collect();
        positions.sort_unstable();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.position < 0 {
                report.error(&format!("entries[{i}].position"), "position must be nonnegative");
            }
            if entry.lift_identifier.trim().is_empty() {
                report.error(&format!("entries[{i}].lift_identifier"), "lift identifier is required");
            }
        }
        for pair in positions.windows(2) {
            if pair[0] == pair[1] {
                report.error("entries", &format!("duplicate rotation position {}", pair[0]));
                break;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly(entries: Vec<WeeklyLookupEntry>) -> CreateWeeklyLookup {
        CreateWeeklyLookup {
            name: "wave".to_string(),
            entries,
        }
    }

    #[test]
    fn dual_mode_weekly_entry_is_rejected() {
        let report = weekly(vec![WeeklyLookupEntry {
            week_number: 1,
            percentages: Some(vec![65.0, 75.0, 85.0]),
            reps: None,
            percentage_modifier: Some(95.0),
        }])
        .validate();
        assert!(!report.valid());
        assert!(report.errors[0].message.contains("mutually exclusive"));
    }

    #[test]
    fn single_mode_weekly_entry_is_accepted() {
        let report = weekly(vec![WeeklyLookupEntry {
            week_number: 1,
            percentages: Some(vec![65.0, 75.0, 85.0]),
            reps: Some(vec![5, 5, -5]),
            percentage_modifier: None,
        }])
        .validate();
        assert!(report.valid());
    }

    #[test]
    fn daily_entry_matches_case_insensitively() {
        let lookup = DailyLookup {
            id: Uuid::new_v4(),
            name: "heavy-light-medium".to_string(),
            entries: vec![DailyLookupEntry {
                day_identifier: "Medium".to_string(),
                percentage_modifier: 90.0,
                intensity_level: Some("medium".to_string()),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(lookup.entry_for("medium").is_some());
        assert!(lookup.entry_for("MEDIUM").is_some());
        assert!(lookup.entry_for("heavy").is_none());
    }

    #[test]
    fn rotation_wraps_modulo_length() {
        let lookup = RotationLookup {
            id: Uuid::new_v4(),
            name: "me-rotation".to_string(),
            entries: vec![
                RotationLookupEntry { position: 0, lift_identifier: "box-squat".to_string() },
                RotationLookupEntry { position: 1, lift_identifier: "deficit-deadlift".to_string() },
                RotationLookupEntry { position: 2, lift_identifier: "front-squat".to_string() },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(lookup.entry_at(4).unwrap().lift_identifier, "deficit-deadlift");
        assert_eq!(lookup.entry_at(0).unwrap().lift_identifier, "box-squat");
    }
}
