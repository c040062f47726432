//! liftlog-cli — terminal client for a running liftlog server
//!
//! # Subcommands
//! - `status`                 — show server health
//! - `submit <file>`          — POST a workout JSON file to /api/workout
//! - `sessions [-n <limit>]`  — list recent sessions with their exercises
//! - `weekly`                 — weekly summary
//! - `monthly`                — monthly summary
//! - `export [-o <file>]`     — download the CSV export

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
const DEFAULT_LIMIT: u32 = 20;
const DEFAULT_EXPORT_PATH: &str = "workout_export.csv";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "liftlog-cli", version, about = "Record and review workouts on a liftlog server")]
struct Cli {
    /// liftlog HTTP server URL (overrides LIFTLOG_HTTP_URL env var)
    #[arg(long, env = "LIFTLOG_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show liftlog server status
    Status,

    /// Submit a workout from a JSON file
    Submit {
        /// File holding `{"date": ..., "exercises": [...]}`
        file: PathBuf,
    },

    /// List recent sessions, newest first
    Sessions {
        /// Maximum number of sessions to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Show the weekly summary
    Weekly,

    /// Show the monthly summary
    Monthly,

    /// Download the full history as CSV
    Export {
        /// Where to write the CSV
        #[arg(short, long, default_value = DEFAULT_EXPORT_PATH)]
        output: PathBuf,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExerciseLine {
    pub name: String,
    pub weight: Option<String>,
    pub reps: Option<i64>,
    #[serde(default)]
    pub rest_pause_reps: i64,
    pub sets: Option<i64>,
    pub target_muscle: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionLine {
    pub id: i64,
    pub date: String,
    pub day_of_week: Option<String>,
    pub facility: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseLine>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionLine>,
}

#[derive(Debug, Deserialize)]
pub struct MuscleCount {
    pub target_muscle: String,
    pub exercise_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct WeekLine {
    pub week_start: String,
    pub session_count: i64,
    pub exercise_count: i64,
    pub avg_exercises_per_session: f64,
    #[serde(default)]
    pub muscles: Vec<MuscleCount>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyResponse {
    pub weeks: Vec<WeekLine>,
}

#[derive(Debug, Deserialize)]
pub struct MonthLine {
    pub month: String,
    pub session_count: i64,
    pub exercise_count: i64,
    pub unique_exercises: i64,
    pub avg_exercises_per_session: f64,
    #[serde(default)]
    pub top_muscles: Vec<MuscleCount>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyResponse {
    pub months: Vec<MonthLine>,
}

// ============================================================================
// Formatting
// ============================================================================

/// `Squat 100kg x5 +RP3 3 sets [legs]`, leaving out whatever is unset.
pub fn format_exercise(e: &ExerciseLine) -> String {
    let mut out = e.name.clone();
    if let Some(weight) = &e.weight {
        out.push(' ');
        out.push_str(weight);
    }
    if let Some(reps) = e.reps {
        out.push_str(&format!(" x{reps}"));
    }
    if e.rest_pause_reps > 0 {
        out.push_str(&format!(" +RP{}", e.rest_pause_reps));
    }
    if let Some(sets) = e.sets {
        out.push_str(&format!(" {sets} sets"));
    }
    if let Some(muscle) = &e.target_muscle {
        out.push_str(&format!(" [{muscle}]"));
    }
    out
}

pub fn format_session(s: &SessionLine) -> String {
    let mut header = format!("#{} {}", s.id, s.date);
    if let Some(day) = &s.day_of_week {
        header.push_str(&format!(" ({day})"));
    }
    if let Some(facility) = &s.facility {
        header.push_str(&format!(" @ {facility}"));
    }

    let mut lines = vec![header];
    lines.extend(s.exercises.iter().map(|e| format!("  - {}", format_exercise(e))));
    lines.join("\n")
}

fn format_muscles(muscles: &[MuscleCount]) -> String {
    muscles
        .iter()
        .map(|m| format!("{} {}", m.target_muscle, m.exercise_count))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_week(w: &WeekLine) -> String {
    let mut line = format!(
        "Week of {}: {} sessions, {} exercises, {:.1} per session",
        w.week_start, w.session_count, w.exercise_count, w.avg_exercises_per_session
    );
    if !w.muscles.is_empty() {
        line.push_str(&format!("\n  muscles: {}", format_muscles(&w.muscles)));
    }
    line
}

pub fn format_month(m: &MonthLine) -> String {
    let mut line = format!(
        "{}: {} sessions, {} exercises ({} distinct), {:.1} per session",
        m.month, m.session_count, m.exercise_count, m.unique_exercises, m.avg_exercises_per_session
    );
    if !m.top_muscles.is_empty() {
        line.push_str(&format!("\n  top muscles: {}", format_muscles(&m.top_muscles)));
    }
    line
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send the request; exits the process on connection failure or a non-2xx status.
fn send(req: reqwest::blocking::RequestBuilder, url: &str) -> reqwest::blocking::Response {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("liftlog-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("no details");
        eprintln!("liftlog-cli: server returned {}: {}", status, message);
        std::process::exit(1);
    }

    resp
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let body: serde_json::Value = send(client(10)?.get(&url), &url).json()?;

    println!("liftlog server: {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
    println!("SQLite:         {}", body["sqlite"].as_str().unwrap_or("?"));
    Ok(())
}

fn do_submit(server: &str, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let workout: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let url = format!("{}/api/workout", server);
    let body: serde_json::Value = send(client(30)?.post(&url).json(&workout), &url).json()?;

    println!(
        "Saved {} exercises to session #{} ({})",
        body["exercises_count"],
        body["session_id"],
        body["date"].as_str().unwrap_or("?")
    );
    Ok(())
}

fn do_sessions(server: &str, limit: u32) -> anyhow::Result<()> {
    let url = format!("{}/api/workouts?limit={}", server, limit);
    let resp: SessionsResponse = send(client(30)?.get(&url), &url).json()?;

    if resp.sessions.is_empty() {
        eprintln!("No sessions recorded yet");
        return Ok(());
    }
    for s in &resp.sessions {
        println!("{}\n", format_session(s));
    }
    Ok(())
}

fn do_weekly(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/api/summary/weekly", server);
    let resp: WeeklyResponse = send(client(30)?.get(&url), &url).json()?;

    if resp.weeks.is_empty() {
        eprintln!("No workouts to summarise");
    }
    for w in &resp.weeks {
        println!("{}", format_week(w));
    }
    Ok(())
}

fn do_monthly(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/api/summary/monthly", server);
    let resp: MonthlyResponse = send(client(30)?.get(&url), &url).json()?;

    if resp.months.is_empty() {
        eprintln!("No workouts to summarise");
    }
    for m in &resp.months {
        println!("{}", format_month(m));
    }
    Ok(())
}

fn do_export(server: &str, output: &Path) -> anyhow::Result<()> {
    let url = format!("{}/api/export", server);
    let bytes = send(client(120)?.get(&url), &url).bytes()?;

    std::fs::write(output, &bytes)
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status => do_status(&server),
        Commands::Submit { file } => do_submit(&server, &file),
        Commands::Sessions { limit } => do_sessions(&server, limit),
        Commands::Weekly => do_weekly(&server),
        Commands::Monthly => do_monthly(&server),
        Commands::Export { output } => do_export(&server, &output),
    };

    if let Err(e) = result {
        eprintln!("liftlog-cli: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
