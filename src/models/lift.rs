use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{is_valid_slug, normalize_slug, ValidationReport};

/// A barbell movement. A lift may be a variation of another lift through
/// `parent_lift_id`; the parent link is informational only and never
/// propagates maxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lift {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_competition_lift: bool,
    pub parent_lift_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLift {
    pub name: String,
    /// Derived from `name` when omitted.
    pub slug: Option<String>,
    pub is_competition_lift: Option<bool>,
    pub parent_lift_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLift {
    pub name: Option<String>,
    pub is_competition_lift: Option<bool>,
    pub parent_lift_id: Option<Uuid>,
}

impl CreateLift {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_derived_from_name_when_absent() {
        let create = CreateLift {
            name: "Close Grip Bench".to_string(),
            slug: None,
            is_competition_lift: None,
            parent_lift_id: None,
        };
        assert!(create.validate().valid());
        assert_eq!(create.resolved_slug(), "close-grip-bench");
    }

    #[test]
    fn rejects_bad_explicit_slug() {
        let create = CreateLift {
            name: "Squat".to_string(),
            slug: Some("Squat!".to_string()),
            is_competition_lift: Some(true),
            parent_lift_id: None,
        };
        let report = create.validate();
        assert!(!report.valid());
        assert_eq!(report.errors[0].field, "slug");
    }
}
