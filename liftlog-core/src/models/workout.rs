use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutSession {
    pub id: i64,
    pub date: NaiveDate,
    pub day_of_week: Option<String>,
    pub facility: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutExercise {
    pub id: i64,
    pub session_id: i64,
    pub name: String,
    pub category: Option<String>,
    /// Free text with units ("60kg", "bodyweight+10").
    pub weight: Option<String>,
    pub reps: Option<i64>,
    pub rest_pause_reps: i64,
    pub sets: Option<i64>,
    pub target_muscle: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A session together with its exercises in stored order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionWithExercises {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub exercises: Vec<WorkoutExercise>,
}

/// Body of a workout submission as sent by the assistant integration.
///
/// Everything is optional at the wire level; required fields are checked by
/// the repository so the caller gets a domain error instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutSubmission {
    pub date: Option<String>,
    pub day_of_week: Option<String>,
    pub facility: Option<String>,
    pub exercises: Option<Vec<NewExercise>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExercise {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub weight: Option<String>,
    pub reps: Option<i64>,
    pub rest_pause_reps: Option<i64>,
    pub sets: Option<i64>,
    pub target_muscle: Option<String>,
    pub notes: Option<String>,
}

impl NewExercise {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub session_id: i64,
    pub date: NaiveDate,
    pub exercises_count: usize,
}

/// Merge patch for a single exercise. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub weight: Option<String>,
    pub reps: Option<i64>,
    pub rest_pause_reps: Option<i64>,
    pub sets: Option<i64>,
    pub target_muscle: Option<String>,
    pub notes: Option<String>,
}

impl ExercisePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, exercise: &mut WorkoutExercise) {
        if let Some(name) = self.name {
            exercise.name = name;
        }
        if let Some(category) = self.category {
            exercise.category = Some(category);
        }
        if let Some(weight) = self.weight {
            exercise.weight = Some(weight);
        }
        if let Some(reps) = self.reps {
            exercise.reps = Some(reps);
        }
        if let Some(rest_pause_reps) = self.rest_pause_reps {
            exercise.rest_pause_reps = rest_pause_reps;
        }
        if let Some(sets) = self.sets {
            exercise.sets = Some(sets);
        }
        if let Some(target_muscle) = self.target_muscle {
            exercise.target_muscle = Some(target_muscle);
        }
        if let Some(notes) = self.notes {
            exercise.notes = Some(notes);
        }
    }
}

// Assistants send weight as either "60kg" or a bare 60.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
