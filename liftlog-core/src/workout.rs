//! Workout sessions and exercises
//!
//! A session is one calendar day; submitting twice for the same date appends
//! exercises to the existing session. Every mutation runs in a single
//! transaction, so readers see either all of a submission or none of it.

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{LiftlogError, Result};
use crate::models::workout::{
    ExercisePatch, NewExercise, SessionWithExercises, SubmissionReceipt, WorkoutExercise,
    WorkoutSession, WorkoutSubmission,
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "date and exercises are required";

const SESSION_COLUMNS: &str = "id, date, day_of_week, facility, created_at";
const EXERCISE_COLUMNS: &str = "id, session_id, name, category, weight, reps, rest_pause_reps, sets, target_muscle, notes, created_at";

#[derive(Debug, Clone)]
pub struct WorkoutRepository {
    pool: SqlitePool,
}

impl WorkoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Record a day's exercises, creating the session for that date on first use.
    pub async fn submit_workout(&self, submission: WorkoutSubmission) -> Result<SubmissionReceipt> {
        let (date, exercises) = match (submission.date.as_deref(), submission.exercises) {
            (Some(date), Some(exercises)) if !date.trim().is_empty() && !exercises.is_empty() => {
                (date.trim().to_string(), exercises)
            }
            _ => return Err(LiftlogError::validation(REQUIRED_FIELDS_MESSAGE)),
        };
        let date = parse_date(&date)?;

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let session_id = find_or_create_session(
            &mut tx,
            date,
            submission.day_of_week.as_deref(),
            submission.facility.as_deref(),
        )
        .await?;

        for exercise in &exercises {
            insert_exercise(&mut tx, session_id, exercise).await?;
        }

        tx.commit().await?;

        tracing::info!(
            session_id,
            date = %date,
            exercises = exercises.len(),
            "Workout submitted"
        );

        Ok(SubmissionReceipt {
            session_id,
            date,
            exercises_count: exercises.len(),
        })
    }

    pub async fn get_session(&self, id: i64) -> Result<SessionWithExercises> {
        let session: WorkoutSession = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LiftlogError::session_not_found(id))?;

        let exercises = self.exercises_for(session.id).await?;
        Ok(SessionWithExercises { session, exercises })
    }

    /// Remove a session and every exercise it owns.
    pub async fn delete_session(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM workout_exercises WHERE session_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM workout_sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(LiftlogError::session_not_found(id));
        }

        tx.commit().await?;
        tracing::info!(session_id = id, "Session deleted");
        Ok(())
    }

    pub async fn get_exercise(&self, id: i64) -> Result<WorkoutExercise> {
        sqlx::query_as(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM workout_exercises WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LiftlogError::exercise_not_found(id))
    }

    /// Apply a merge patch; fields absent from `patch` keep their stored values.
    pub async fn update_exercise(&self, id: i64, patch: ExercisePatch) -> Result<WorkoutExercise> {
        let mut tx = self.pool.begin().await?;

        let mut exercise: WorkoutExercise = sqlx::query_as(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM workout_exercises WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LiftlogError::exercise_not_found(id))?;

        patch.apply(&mut exercise);

        sqlx::query(
            r#"
            UPDATE workout_exercises
            SET name = ?, category = ?, weight = ?, reps = ?, rest_pause_reps = ?,
                sets = ?, target_muscle = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&exercise.name)
        .bind(&exercise.category)
        .bind(&exercise.weight)
        .bind(exercise.reps)
        .bind(exercise.rest_pause_reps)
        .bind(exercise.sets)
        .bind(&exercise.target_muscle)
        .bind(&exercise.notes)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(exercise_id = id, "Exercise updated");
        Ok(exercise)
    }

    pub async fn delete_exercise(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM workout_exercises WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(LiftlogError::exercise_not_found(id));
        }

        tx.commit().await?;
        tracing::info!(exercise_id = id, "Exercise deleted");
        Ok(())
    }

    /// Most recent sessions first, each with its full exercise list.
    pub async fn list_recent_sessions(&self, limit: u32) -> Result<Vec<SessionWithExercises>> {
        let sessions: Vec<WorkoutSession> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions ORDER BY date DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(sessions.len());
        for session in sessions {
            let exercises = self.exercises_for(session.id).await?;
            result.push(SessionWithExercises { session, exercises });
        }
        Ok(result)
    }

    /// Every session in date order, oldest first.
    pub async fn all_sessions_ascending(&self) -> Result<Vec<SessionWithExercises>> {
        let sessions: Vec<WorkoutSession> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions ORDER BY date ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(sessions.len());
        for session in sessions {
            let exercises = self.exercises_for(session.id).await?;
            result.push(SessionWithExercises { session, exercises });
        }
        Ok(result)
    }

    async fn exercises_for(&self, session_id: i64) -> Result<Vec<WorkoutExercise>> {
        let exercises = sqlx::query_as(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM workout_exercises WHERE session_id = ? ORDER BY id"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exercises)
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        LiftlogError::validation(format!("invalid date '{raw}', expected YYYY-MM-DD"))
    })
}

/// Atomic upsert keyed on the unique date; concurrent submitters converge on one row.
async fn find_or_create_session(
    tx: &mut Transaction<'_, Sqlite>,
    date: NaiveDate,
    day_of_week: Option<&str>,
    facility: Option<&str>,
) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO workout_sessions (date, day_of_week, facility, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(date) DO NOTHING
        "#,
    )
    .bind(date)
    .bind(day_of_week)
    .bind(facility)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM workout_sessions WHERE date = ?")
        .bind(date)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

async fn insert_exercise(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: i64,
    exercise: &NewExercise,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO workout_exercises
            (session_id, name, category, weight, reps, rest_pause_reps, sets, target_muscle, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session_id)
    .bind(&exercise.name)
    .bind(&exercise.category)
    .bind(&exercise.weight)
    .bind(exercise.reps)
    .bind(exercise.rest_pause_reps.unwrap_or(0))
    .bind(exercise.sets)
    .bind(&exercise.target_muscle)
    .bind(&exercise.notes)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
