//! Weekly and monthly workout summaries
//!
//! Weeks start on Monday. Grouping inner-joins sessions to exercises, so a
//! session with no exercises never shows up in any period, even if it is the
//! only session of that period.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::workout::parse_date;

pub const WEEKS_SHOWN: i64 = 8;
pub const MONTHS_SHOWN: i64 = 6;
/// Total (week, muscle) rows returned across all weeks.
pub const WEEKLY_MUSCLE_ROWS: i64 = 50;
/// Muscles shown per month in reports.
pub const MONTHLY_TOP_MUSCLES: usize = 5;

// Monday of the week containing s.date; strftime('%w') is 0 for Sunday.
const WEEK_START_SQL: &str =
    "date(s.date, '-' || ((CAST(strftime('%w', s.date) AS INTEGER) + 6) % 7) || ' days')";
const MONTH_SQL: &str = "strftime('%Y-%m', s.date)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekStats {
    pub week_start: NaiveDate,
    pub session_count: i64,
    pub exercise_count: i64,
    pub avg_exercises_per_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyMuscleCount {
    pub week_start: NaiveDate,
    pub target_muscle: String,
    pub exercise_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStats {
    /// `YYYY-MM`
    pub month: String,
    pub session_count: i64,
    pub exercise_count: i64,
    pub unique_exercises: i64,
    pub avg_exercises_per_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMuscleCount {
    pub month: String,
    pub target_muscle: String,
    pub exercise_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub weeks: Vec<WeekStats>,
    pub muscles: Vec<WeeklyMuscleCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub months: Vec<MonthStats>,
    pub muscles: Vec<MonthlyMuscleCount>,
}

/// One week with its muscle breakdown, shaped for display.
#[derive(Debug, Clone, Serialize)]
pub struct WeekReport<'a> {
    #[serde(flatten)]
    pub stats: &'a WeekStats,
    pub muscles: Vec<&'a WeeklyMuscleCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthReport<'a> {
    #[serde(flatten)]
    pub stats: &'a MonthStats,
    pub top_muscles: Vec<&'a MonthlyMuscleCount>,
}

impl WeeklySummary {
    pub fn muscles_for(&self, week_start: NaiveDate) -> Vec<&WeeklyMuscleCount> {
        self.muscles
            .iter()
            .filter(|m| m.week_start == week_start)
            .collect()
    }

    pub fn report(&self) -> Vec<WeekReport<'_>> {
        self.weeks
            .iter()
            .map(|stats| WeekReport {
                stats,
                muscles: self.muscles_for(stats.week_start),
            })
            .collect()
    }
}

impl MonthlySummary {
    /// Muscles for `month`, most trained first, at most `n`.
    pub fn top_muscles(&self, month: &str, n: usize) -> Vec<&MonthlyMuscleCount> {
        self.muscles
            .iter()
            .filter(|m| m.month == month)
            .take(n)
            .collect()
    }

    pub fn report(&self) -> Vec<MonthReport<'_>> {
        self.months
            .iter()
            .map(|stats| MonthReport {
                stats,
                top_muscles: self.top_muscles(&stats.month, MONTHLY_TOP_MUSCLES),
            })
            .collect()
    }
}

/// `exercise_count / session_count` to one decimal, 0 when there are no sessions.
pub fn average_per_session(exercise_count: i64, session_count: i64) -> f64 {
    if session_count <= 0 {
        return 0.0;
    }
    let avg = exercise_count as f64 / session_count as f64;
    (avg * 10.0).round() / 10.0
}

#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    pool: SqlitePool,
}

impl SummaryAggregator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn weekly_summary(&self) -> Result<WeeklySummary> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(&format!(
            r#"
            SELECT {WEEK_START_SQL} AS week_start,
                   COUNT(DISTINCT s.id) AS session_count,
                   COUNT(e.id) AS exercise_count
            FROM workout_sessions s
            JOIN workout_exercises e ON e.session_id = s.id
            GROUP BY week_start
            ORDER BY week_start DESC
            LIMIT ?
            "#
        ))
        .bind(WEEKS_SHOWN)
        .fetch_all(&self.pool)
        .await?;

        let mut weeks = Vec::with_capacity(rows.len());
        for (week_start, session_count, exercise_count) in rows {
            weeks.push(WeekStats {
                week_start: parse_date(&week_start)?,
                session_count,
                exercise_count,
                avg_exercises_per_session: average_per_session(exercise_count, session_count),
            });
        }

        let muscle_rows = sqlx::query_as::<_, (String, String, i64)>(&format!(
            r#"
            SELECT {WEEK_START_SQL} AS week_start,
                   e.target_muscle,
                   COUNT(e.id) AS exercise_count
            FROM workout_sessions s
            JOIN workout_exercises e ON e.session_id = s.id
            WHERE e.target_muscle IS NOT NULL
            GROUP BY week_start, e.target_muscle
            ORDER BY week_start DESC, exercise_count DESC, e.target_muscle
            LIMIT ?
            "#
        ))
        .bind(WEEKLY_MUSCLE_ROWS)
        .fetch_all(&self.pool)
        .await?;

        let mut muscles = Vec::with_capacity(muscle_rows.len());
        for (week_start, target_muscle, exercise_count) in muscle_rows {
            muscles.push(WeeklyMuscleCount {
                week_start: parse_date(&week_start)?,
                target_muscle,
                exercise_count,
            });
        }

        tracing::debug!(weeks = weeks.len(), muscles = muscles.len(), "Weekly summary built");
        Ok(WeeklySummary { weeks, muscles })
    }

    pub async fn monthly_summary(&self) -> Result<MonthlySummary> {
        let rows = sqlx::query_as::<_, (String, i64, i64, i64)>(&format!(
            r#"
            SELECT {MONTH_SQL} AS month,
                   COUNT(DISTINCT s.id) AS session_count,
                   COUNT(e.id) AS exercise_count,
                   COUNT(DISTINCT e.name) AS unique_exercises
            FROM workout_sessions s
            JOIN workout_exercises e ON e.session_id = s.id
            GROUP BY month
            ORDER BY month DESC
            LIMIT ?
            "#
        ))
        .bind(MONTHS_SHOWN)
        .fetch_all(&self.pool)
        .await?;

        let months = rows
            .into_iter()
            .map(|(month, session_count, exercise_count, unique_exercises)| MonthStats {
                month,
                session_count,
                exercise_count,
                unique_exercises,
                avg_exercises_per_session: average_per_session(exercise_count, session_count),
            })
            .collect();

        let muscles = sqlx::query_as::<_, (String, String, i64)>(&format!(
            r#"
            SELECT {MONTH_SQL} AS month,
                   e.target_muscle,
                   COUNT(e.id) AS exercise_count
            FROM workout_sessions s
            JOIN workout_exercises e ON e.session_id = s.id
            WHERE e.target_muscle IS NOT NULL
            GROUP BY month, e.target_muscle
            ORDER BY month DESC, exercise_count DESC, e.target_muscle
            "#
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(month, target_muscle, exercise_count)| MonthlyMuscleCount {
            month,
            target_muscle,
            exercise_count,
        })
        .collect();

        Ok(MonthlySummary { months, muscles })
    }
}
