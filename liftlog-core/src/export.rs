//! Flat export of the whole exercise history, one row per exercise.

use serde::Serialize;

use crate::error::Result;
use crate::models::workout::{SessionWithExercises, WorkoutExercise};
use crate::workout::WorkoutRepository;

pub const EXPORT_HEADERS: [&str; 11] = [
    "date",
    "day_of_week",
    "facility",
    "exercise_name",
    "category",
    "weight",
    "reps",
    "rest_pause_reps",
    "sets",
    "target_muscle",
    "notes",
];

pub const EXPORT_FILENAME: &str = "workout_export.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// `YYYY/MM/DD`
    pub date: String,
    pub day_of_week: String,
    pub facility: String,
    pub exercise_name: String,
    pub category: String,
    pub weight: String,
    pub reps: String,
    /// Empty unless the exercise had rest-pause reps.
    pub rest_pause_display: String,
    pub sets: String,
    pub target_muscle: String,
    pub notes: String,
}

impl ExportRow {
    pub fn from_parts(session: &SessionWithExercises, exercise: &WorkoutExercise) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let number = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();

        Self {
            date: session.session.date.format("%Y/%m/%d").to_string(),
            day_of_week: text(&session.session.day_of_week),
            facility: text(&session.session.facility),
            exercise_name: exercise.name.clone(),
            category: text(&exercise.category),
            weight: text(&exercise.weight),
            reps: number(exercise.reps),
            rest_pause_display: rest_pause_display(exercise.rest_pause_reps),
            sets: number(exercise.sets),
            target_muscle: text(&exercise.target_muscle),
            notes: text(&exercise.notes),
        }
    }

    pub fn cells(&self) -> [&str; 11] {
        [
            self.date.as_str(),
            self.day_of_week.as_str(),
            self.facility.as_str(),
            self.exercise_name.as_str(),
            self.category.as_str(),
            self.weight.as_str(),
            self.reps.as_str(),
            self.rest_pause_display.as_str(),
            self.sets.as_str(),
            self.target_muscle.as_str(),
            self.notes.as_str(),
        ]
    }
}

pub fn rest_pause_display(rest_pause_reps: i64) -> String {
    if rest_pause_reps > 0 {
        rest_pause_reps.to_string()
    } else {
        String::new()
    }
}

/// Sessions oldest first, exercises in stored order.
pub fn flatten(sessions: &[SessionWithExercises]) -> Vec<ExportRow> {
    sessions
        .iter()
        .flat_map(|session| {
            session
                .exercises
                .iter()
                .map(move |exercise| ExportRow::from_parts(session, exercise))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TabularExporter {
    repo: WorkoutRepository,
}

impl TabularExporter {
    pub fn new(repo: WorkoutRepository) -> Self {
        Self { repo }
    }

    pub async fn build_table(&self) -> Result<Vec<ExportRow>> {
        let sessions = self.repo.all_sessions_ascending().await?;
        let rows = flatten(&sessions);
        tracing::debug!(sessions = sessions.len(), rows = rows.len(), "Export table built");
        Ok(rows)
    }
}

/// Render rows as CSV with a header line. Cells are quoted only when needed.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    push_line(&mut out, &EXPORT_HEADERS);
    for row in rows {
        push_line(&mut out, &row.cells());
    }
    out
}

fn push_line(out: &mut String, cells: &[&str]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}
