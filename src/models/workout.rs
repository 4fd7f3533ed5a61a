use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lift display info carried on a resolved exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftInfo {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// One concrete set of a resolved workout. Serialized camelCase: this shape
/// is the wire contract for generated workouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSet {
    pub set_number: i32,
    pub weight: f64,
    pub target_reps: i32,
    pub is_amrap: bool,
    pub is_work_set: bool,
}

/// One resolved prescription: the lift, its sets, and presentation extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedExercise {
    pub prescription_id: Uuid,
    pub lift: LiftInfo,
    pub sets: Vec<GeneratedSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<i32>,
}

/// A fully resolved training session, ready to display. Exercise order is
/// the program author's; the engine never reorders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWorkout {
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub cycle_iteration: i32,
    pub week_number: i32,
    pub day_slug: String,
    pub date: NaiveDate,
    pub exercises: Vec<ResolvedExercise>,
}

impl ResolvedExercise {
    /// The heaviest work set, used by computed load strategies downstream.
    pub fn top_work_set(&self) -> Option<&GeneratedSet> {
        self.sets
            .iter()
            .filter(|s| s.is_work_set)
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_camel_case() {
        let set = GeneratedSet {
            set_number: 1,
            weight: 225.0,
            target_reps: 5,
            is_amrap: false,
            is_work_set: true,
        };
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("setNumber").is_some());
        assert!(json.get("targetReps").is_some());
        assert!(json.get("isWorkSet").is_some());
        assert!(json.get("set_number").is_none());
    }

    #[test]
    fn top_work_set_ignores_warmups() {
        let exercise = ResolvedExercise {
            prescription_id: Uuid::new_v4(),
            lift: LiftInfo {
                id: Uuid::new_v4(),
                name: "Squat".to_string(),
                slug: "squat".to_string(),
            },
            sets: vec![
                GeneratedSet { set_number: 1, weight: 150.0, target_reps: 5, is_amrap: false, is_work_set: false },
                GeneratedSet { set_number: 2, weight: 300.0, target_reps: 5, is_amrap: false, is_work_set: true },
                GeneratedSet { set_number: 3, weight: 270.0, target_reps: 5, is_amrap: false, is_work_set: true },
            ],
            notes: None,
            rest_seconds: None,
        };
        assert_eq!(exercise.top_work_set().unwrap().weight, 300.0);
    }
}
