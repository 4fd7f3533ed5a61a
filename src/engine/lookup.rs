use crate::models::{DailyLookup, LookupKey, RotationLookup, WeeklyLookup};

/// Resolution-time view over the program's periodization tables. Borrowed,
/// cheap to copy per set, and read-only.
#[derive(Debug, Clone, Copy)]
pub struct LookupContext<'a> {
    pub week_number: i32,
    pub day_slug: &'a str,
    /// 1-based set index; 0 disables per-set overrides (ramp bases).
    pub set_number: i32,
    pub rotation_position: i32,
    pub weekly: Option<&'a WeeklyLookup>,
    pub daily: Option<&'a DailyLookup>,
    pub rotation: Option<&'a RotationLookup>,
}

impl<'a> LookupContext<'a> {
    pub fn with_set(mut self, set_number: i32) -> Self {
        self.set_number = set_number;
        self
    }

    /// Stack the periodization modifiers onto a base percentage. The order
    /// is contractual: weekly first (a per-set entry replaces the base
    /// outright, a scalar entry multiplies), then the daily modifier
    /// multiplies the result.
    pub fn apply_modifiers(&self, base: f64, key: LookupKey) -> f64 {
        let mut result = base;

        if key.uses_weekly() {
            if let Some(entry) = self.weekly.and_then(|w| w.entry_for(self.week_number)) {
                let overridden = entry
                    .percentages
                    .as_ref()
                    .filter(|_| self.set_number > 0)
                    .and_then(|percentages| percentages.get(self.set_number as usize - 1));
                if let Some(replacement) = overridden {
                    result = *replacement;
                } else if let Some(modifier) = entry.percentage_modifier {
                    result *= modifier / 100.0;
                }
            }
        }

        if key.uses_daily() {
            if let Some(entry) = self.daily.and_then(|d| d.entry_for(self.day_slug)) {
                if entry.percentage_modifier != 0.0 {
                    result *= entry.percentage_modifier / 100.0;
                }
            }
        }

        result
    }

    /// Weekly per-set percentage for a 1-based set index, if the table
    /// defines one.
    pub fn percentage_for_set(&self, set_number: i32) -> Option<f64> {
        if set_number < 1 {
            return None;
        }
        self.weekly
            .and_then(|w| w.entry_for(self.week_number))
            .and_then(|entry| entry.percentages.as_ref())
            .and_then(|percentages| percentages.get(set_number as usize - 1))
            .copied()
    }

    /// Weekly per-set rep target for a 1-based set index. Negative values
    /// mean "at least |r|, AMRAP" and are passed through for the scheme to
    /// interpret.
    pub fn reps_for_set(&self, set_number: i32) -> Option<i32> {
        if set_number < 1 {
            return None;
        }
        self.weekly
            .and_then(|w| w.entry_for(self.week_number))
            .and_then(|entry| entry.reps.as_ref())
            .and_then(|reps| reps.get(set_number as usize - 1))
            .copied()
    }

    /// The rotation table's focus lift for the current position.
    pub fn focus_lift(&self) -> Option<&'a str> {
        self.rotation
            .and_then(|r| r.entry_at(self.rotation_position))
            .map(|entry| entry.lift_identifier.as_str())
    }
}
