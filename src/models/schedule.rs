use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::validation::{is_valid_slug, normalize_slug, ValidationReport};

/// Weekday labels on a week's days are advisory for display; the position of
/// a day within the week's list is what advancement follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mon" => Ok(Weekday::Mon),
            "tue" => Ok(Weekday::Tue),
            "wed" => Ok(Weekday::Wed),
            "thu" => Ok(Weekday::Thu),
            "fri" => Ok(Weekday::Fri),
            "sat" => Ok(Weekday::Sat),
            "sun" => Ok(Weekday::Sun),
            other => Err(format!("unknown weekday: {other}")),
        }
    }
}

/// A/B alternation label, used by programs that rotate two day templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekVariant {
    A,
    B,
}

impl WeekVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekVariant::A => "A",
            WeekVariant::B => "B",
        }
    }
}

impl FromStr for WeekVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(WeekVariant::A),
            "B" => Ok(WeekVariant::B),
            other => Err(format!("unknown week variant: {other}")),
        }
    }
}

/// A named training day template. Slugs are unique within a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub metadata: Option<Value>,
    pub program_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ordered attachment of a prescription to a day. The same prescription may
/// appear in several days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPrescription {
    pub day_id: Uuid,
    pub prescription_id: Uuid,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDay {
    pub name: String,
    pub slug: Option<String>,
    pub metadata: Option<Value>,
    pub program_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDay {
    pub name: Option<String>,
    pub metadata: Option<Value>,
    pub program_id: Option<Uuid>,
}

impl CreateDay {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.error("name", "name is required");
        }
        match &self.slug {
            Some(slug) if !is_valid_slug(slug) => {
                report.error("slug", "slug must be lowercase alphanumeric with single hyphens");
            }
            None if normalize_slug(&self.name).is_empty() => {
                report.error("slug", "a slug could not be derived from the name");
            }
            _ => {}
        }
        report
    }

    pub fn resolved_slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| normalize_slug(&self.name))
    }
}

/// One week of a cycle. `week_number` is 1-based and dense within the cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Week {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub week_number: i32,
    pub variant: Option<WeekVariant>,
}

/// A day's slot within a week. `position` is the authoritative ordering;
/// `day_of_week` is a display label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekDay {
    pub week_id: Uuid,
    pub day_id: Uuid,
    pub day_of_week: Weekday,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWeek {
    pub cycle_id: Uuid,
    pub week_number: i32,
    pub variant: Option<WeekVariant>,
}

impl CreateWeek {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.week_number < 1 {
            report.error("week_number", "week number must be at least 1");
        }
        report
    }
}

/// A fixed-length block of weeks, the unit a program repeats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    pub name: String,
    pub length_weeks: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCycle {
    pub name: String,
    pub length_weeks: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCycle {
    pub name: Option<String>,
    pub length_weeks: Option<i32>,
}

impl CreateCycle {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.error("name", "name is required");
        }
        if self.length_weeks < 1 {
            report.error("length_weeks", "cycle length must be at least one week");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parse_round_trip() {
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(day.as_str().parse::<Weekday>().unwrap(), day);
        }
    }

    #[test]
    fn cycle_length_must_be_positive() {
        let create = CreateCycle {
            name: "Base block".to_string(),
            length_weeks: 0,
        };
        assert!(!create.validate().valid());
    }
}
