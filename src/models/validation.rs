use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// A non-fatal advisory attached to an otherwise successful operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub field: String,
    pub message: String,
}

/// Accumulating validation result. Constructors collect every problem they
/// find instead of stopping at the first; callers proceed only when
/// `valid()` holds. Warnings travel with success and must reach the API
/// consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
    pub warnings: Vec<FieldWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn warning(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(FieldWarning {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn require(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.error(field, message);
        }
    }

    /// Fold another report into this one, preserving order.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

fn slug_pattern() -> &'static Regex {
    static SLUG_RE: OnceLock<Regex> = OnceLock::new();
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap())
}

/// Whether `slug` is lowercase alphanumeric with interior single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

/// Derive a slug from a free-form name: lowercase, non-alphanumeric runs
/// collapse to a single hyphen, leading/trailing hyphens stripped.
pub fn normalize_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_errors_in_order() {
        let mut report = ValidationReport::new();
        report.error("name", "is required");
        report.error("slug", "is malformed");
        assert!(!report.valid());
        assert_eq!(report.errors[0].field, "name");
        assert_eq!(report.errors[1].field, "slug");
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut report = ValidationReport::new();
        report.warning("value", "training max is below 80% of 1RM");
        assert!(report.valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn slug_grammar() {
        assert!(is_valid_slug("squat"));
        assert!(is_valid_slug("close-grip-bench"));
        assert!(is_valid_slug("day-1"));
        assert!(!is_valid_slug("Squat"));
        assert!(!is_valid_slug("bench--press"));
        assert!(!is_valid_slug("-squat"));
        assert!(!is_valid_slug("squat-"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn normalize_collapses_punctuation() {
        assert_eq!(normalize_slug("Close-Grip Bench Press"), "close-grip-bench-press");
        assert_eq!(normalize_slug("  Day 1 (Heavy)  "), "day-1-heavy");
        assert_eq!(normalize_slug("5/3/1"), "5-3-1");
    }
}
