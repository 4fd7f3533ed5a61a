use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::prescription::Rounding;
use super::validation::{is_valid_slug, normalize_slug, ValidationReport};

/// A named bundle: one cycle, up to three optional periodization lookups,
/// and the rounding policy applied when a prescription leaves its own
/// rounding at the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub cycle_id: Uuid,
    pub weekly_lookup_id: Option<Uuid>,
    pub daily_lookup_id: Option<Uuid>,
    pub rotation_lookup_id: Option<Uuid>,
    pub default_rounding: Rounding,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProgram {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub cycle_id: Uuid,
    pub weekly_lookup_id: Option<Uuid>,
    pub daily_lookup_id: Option<Uuid>,
    pub rotation_lookup_id: Option<Uuid>,
    pub default_rounding: Option<Rounding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgram {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cycle_id: Option<Uuid>,
    pub weekly_lookup_id: Option<Uuid>,
    pub daily_lookup_id: Option<Uuid>,
    pub rotation_lookup_id: Option<Uuid>,
    pub default_rounding: Option<Rounding>,
}

impl CreateProgram {
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
        if let Some(rounding) = &self.default_rounding {
            if rounding.increment <= 0.0 {
                report.error("default_rounding.increment", "rounding increment must be positive");
            }
        }
        report
    }

    pub fn resolved_slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| normalize_slug(&self.name))
    }
}

/// Attaches a progression rule to a program for one lift. Lower priority
/// applies first; links created earlier break priority ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramProgression {
    pub id: Uuid,
    pub program_id: Uuid,
    pub progression_id: Uuid,
    pub lift_id: Uuid,
    pub priority: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProgramProgression {
    pub progression_id: Uuid,
    pub lift_id: Uuid,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgramProgression {
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
}
