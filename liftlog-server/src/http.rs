//! liftlog HTTP API
//!
//! Axum server that receives payloads from the assistant integration and
//! serves the stored feeds, workout sessions, summaries and the CSV export.
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! returning `(StatusCode, serde_json::Value)`, so the logic can be tested
//! without going through the router.
//!
//! Endpoints:
//! - GET    /health               — health check with DB status
//! - GET    /version              — server version info
//! - POST   /api/receive          — store an arbitrary JSON payload
//! - POST   /api/conversation     — store a conversation record
//! - GET    /api/logs             — processing log, newest first
//! - GET    /api/data             — received payloads, newest first
//! - GET    /api/conversations    — conversations, newest first
//! - POST   /api/workout          — submit a day's exercises
//! - GET    /api/workouts         — recent sessions (`?limit=N`)
//! - GET    /api/workout/:id      — one session with its exercises
//! - DELETE /api/workout/:id      — delete a session and its exercises
//! - PUT    /api/exercise/:id     — merge-patch one exercise
//! - DELETE /api/exercise/:id     — delete one exercise
//! - GET    /api/summary/weekly   — last 8 weeks
//! - GET    /api/summary/monthly  — last 6 months
//! - GET    /api/export           — full history as CSV

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use liftlog_core::export::{to_csv, EXPORT_FILENAME};
use liftlog_core::models::{ExercisePatch, WorkoutSubmission};
use liftlog_core::{
    Feeds, LiftlogError, SummaryAggregator, TabularExporter, WorkoutRepository,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub const NO_JSON_MESSAGE: &str = "No JSON data received";
pub const DEFAULT_SESSION_LIMIT: u32 = 20;
pub const MAX_SESSION_LIMIT: u32 = 100;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub pool: SqlitePool,
    pub feeds: Feeds,
    pub workouts: WorkoutRepository,
    pub summaries: SummaryAggregator,
    pub exporter: TabularExporter,
}

impl HttpState {
    pub fn new(pool: SqlitePool, feeds: Feeds) -> Self {
        let workouts = WorkoutRepository::new(pool.clone());
        Self {
            summaries: SummaryAggregator::new(pool.clone()),
            exporter: TabularExporter::new(workouts.clone()),
            workouts,
            feeds,
            pool,
        }
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/receive", post(receive_handler))
        .route("/api/conversation", post(conversation_handler))
        .route("/api/logs", get(logs_handler))
        .route("/api/data", get(data_handler))
        .route("/api/conversations", get(conversations_handler))
        .route("/api/workout", post(submit_workout_handler))
        .route("/api/workouts", get(list_sessions_handler))
        .route(
            "/api/workout/:id",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route(
            "/api/exercise/:id",
            put(update_exercise_handler).delete(delete_exercise_handler),
        )
        .route("/api/summary/weekly", get(weekly_summary_handler))
        .route("/api/summary/monthly", get(monthly_summary_handler))
        .route("/api/export", get(export_handler))
        .with_state(state)
}

/// Start the HTTP server on `addr`.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: HttpState,
    addr: &str,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("liftlog HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    pub limit: Option<u32>,
}

// ============================================================================
// Error mapping and log feed bookkeeping
// ============================================================================

pub fn status_for(err: &LiftlogError) -> StatusCode {
    match err {
        LiftlogError::Validation(_) => StatusCode::BAD_REQUEST,
        LiftlogError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Record a failed request in the log feed and shape the error body.
async fn failure(feeds: &Feeds, event_type: &str, err: LiftlogError) -> (StatusCode, Value) {
    let status = status_for(&err);
    let message = err.to_string();

    if status.is_server_error() {
        tracing::error!(event_type, error = %message, "Request failed");
    } else {
        tracing::warn!(event_type, error = %message, "Request rejected");
    }

    if let Err(e) = feeds.log_error(event_type, &message).await {
        tracing::error!("Failed to write log feed: {}", e);
    }

    (status, json!({ "error": message, "status": "error" }))
}

async fn record_success(feeds: &Feeds, event_type: &str, payload: Option<Value>) {
    if let Err(e) = feeds.log_success(event_type, payload).await {
        tracing::error!("Failed to write log feed: {}", e);
    }
}

/// Decode a request body; an empty body counts as missing JSON.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, LiftlogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(LiftlogError::validation(NO_JSON_MESSAGE));
    }
    serde_json::from_slice(body).map_err(|e| LiftlogError::validation(format!("Invalid JSON: {e}")))
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check — queries DB and returns (status_code, json_body).
pub async fn health_inner(pool: &SqlitePool) -> (StatusCode, Value) {
    match liftlog_core::db::health_check(pool).await {
        Ok(version) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "sqlite": version,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "liftlog/1",
    })
}

pub async fn receive_inner(state: &HttpState, body: &[u8]) -> (StatusCode, Value) {
    const EVENT: &str = "receive_data";

    let payload: Value = match parse_body(body) {
        Ok(Value::Null) => {
            return failure(&state.feeds, EVENT, LiftlogError::validation(NO_JSON_MESSAGE)).await
        }
        Ok(v) => v,
        Err(e) => return failure(&state.feeds, EVENT, e).await,
    };

    match state.feeds.receive(payload.clone()).await {
        Ok(record) => {
            record_success(&state.feeds, EVENT, Some(payload.clone())).await;
            (
                StatusCode::OK,
                json!({
                    "status": "success",
                    "message": "Data received and saved",
                    "timestamp": record.timestamp,
                    "received_data": payload,
                }),
            )
        }
        Err(e) => failure(&state.feeds, EVENT, e).await,
    }
}

pub async fn conversation_inner(state: &HttpState, body: &[u8]) -> (StatusCode, Value) {
    const EVENT: &str = "save_conversation";

    let payload: Value = match parse_body(body) {
        Ok(v) => v,
        Err(e) => return failure(&state.feeds, EVENT, e).await,
    };

    match state.feeds.record_conversation(payload).await {
        Ok(record) => {
            record_success(
                &state.feeds,
                EVENT,
                Some(json!({ "conversation_id": record.conversation_id })),
            )
            .await;
            (
                StatusCode::OK,
                json!({
                    "status": "success",
                    "message": "Conversation saved",
                    "timestamp": record.timestamp,
                    "conversation_id": record.conversation_id,
                }),
            )
        }
        Err(e) => failure(&state.feeds, EVENT, e).await,
    }
}

pub async fn logs_inner(state: &HttpState) -> (StatusCode, Value) {
    let records = state.feeds.logs.list_newest_first().await;
    (StatusCode::OK, json!({ "count": records.len(), "records": records }))
}

pub async fn data_inner(state: &HttpState) -> (StatusCode, Value) {
    let records = state.feeds.received.list_newest_first().await;
    (StatusCode::OK, json!({ "count": records.len(), "records": records }))
}

pub async fn conversations_inner(state: &HttpState) -> (StatusCode, Value) {
    let records = state.feeds.conversations.list_newest_first().await;
    (StatusCode::OK, json!({ "count": records.len(), "records": records }))
}

pub async fn submit_workout_inner(state: &HttpState, body: &[u8]) -> (StatusCode, Value) {
    const EVENT: &str = "submit_workout";

    let submission: WorkoutSubmission = match parse_body(body) {
        Ok(s) => s,
        Err(e) => return failure(&state.feeds, EVENT, e).await,
    };

    match state.workouts.submit_workout(submission).await {
        Ok(receipt) => {
            let body = json!({
                "status": "success",
                "session_id": receipt.session_id,
                "date": receipt.date,
                "exercises_count": receipt.exercises_count,
            });
            record_success(&state.feeds, EVENT, Some(body.clone())).await;
            (StatusCode::OK, body)
        }
        Err(e) => failure(&state.feeds, EVENT, e).await,
    }
}

pub async fn list_sessions_inner(state: &HttpState, params: ListParams) -> (StatusCode, Value) {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SESSION_LIMIT)
        .min(MAX_SESSION_LIMIT);

    match state.workouts.list_recent_sessions(limit).await {
        Ok(sessions) => (
            StatusCode::OK,
            json!({ "count": sessions.len(), "sessions": sessions }),
        ),
        Err(e) => failure(&state.feeds, "list_sessions", e).await,
    }
}

pub async fn get_session_inner(state: &HttpState, id: i64) -> (StatusCode, Value) {
    match state.workouts.get_session(id).await {
        Ok(session) => (StatusCode::OK, json!(session)),
        Err(e) => failure(&state.feeds, "get_session", e).await,
    }
}

pub async fn delete_session_inner(state: &HttpState, id: i64) -> (StatusCode, Value) {
    const EVENT: &str = "delete_session";

    match state.workouts.delete_session(id).await {
        Ok(()) => {
            record_success(&state.feeds, EVENT, Some(json!({ "session_id": id }))).await;
            (
                StatusCode::OK,
                json!({ "status": "success", "deleted_session_id": id }),
            )
        }
        Err(e) => failure(&state.feeds, EVENT, e).await,
    }
}

pub async fn update_exercise_inner(state: &HttpState, id: i64, body: &[u8]) -> (StatusCode, Value) {
    const EVENT: &str = "update_exercise";

    let patch: ExercisePatch = match parse_body(body) {
        Ok(p) => p,
        Err(e) => return failure(&state.feeds, EVENT, e).await,
    };

    match state.workouts.update_exercise(id, patch).await {
        Ok(exercise) => {
            record_success(&state.feeds, EVENT, Some(json!({ "exercise_id": id }))).await;
            (
                StatusCode::OK,
                json!({ "status": "success", "exercise_id": id, "exercise": exercise }),
            )
        }
        Err(e) => failure(&state.feeds, EVENT, e).await,
    }
}

pub async fn delete_exercise_inner(state: &HttpState, id: i64) -> (StatusCode, Value) {
    const EVENT: &str = "delete_exercise";

    match state.workouts.delete_exercise(id).await {
        Ok(()) => {
            record_success(&state.feeds, EVENT, Some(json!({ "exercise_id": id }))).await;
            (
                StatusCode::OK,
                json!({ "status": "success", "deleted_exercise_id": id }),
            )
        }
        Err(e) => failure(&state.feeds, EVENT, e).await,
    }
}

pub async fn weekly_summary_inner(state: &HttpState) -> (StatusCode, Value) {
    match state.summaries.weekly_summary().await {
        Ok(summary) => (StatusCode::OK, json!({ "weeks": summary.report() })),
        Err(e) => failure(&state.feeds, "weekly_summary", e).await,
    }
}

pub async fn monthly_summary_inner(state: &HttpState) -> (StatusCode, Value) {
    match state.summaries.monthly_summary().await {
        Ok(summary) => (StatusCode::OK, json!({ "months": summary.report() })),
        Err(e) => failure(&state.feeds, "monthly_summary", e).await,
    }
}

/// Inner export — the CSV document, or an error response.
pub async fn export_inner(state: &HttpState) -> std::result::Result<String, (StatusCode, Value)> {
    match state.exporter.build_table().await {
        Ok(rows) => {
            record_success(
                &state.feeds,
                "export",
                Some(json!({ "rows": rows.len(), "at": Utc::now() })),
            )
            .await;
            Ok(to_csv(&rows))
        }
        Err(e) => Err(failure(&state.feeds, "export", e).await),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn receive_handler(State(state): State<Arc<HttpState>>, body: Bytes) -> impl IntoResponse {
    let (status, body) = receive_inner(&state, &body).await;
    (status, Json(body))
}

pub async fn conversation_handler(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> impl IntoResponse {
    let (status, body) = conversation_inner(&state, &body).await;
    (status, Json(body))
}

pub async fn logs_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = logs_inner(&state).await;
    (status, Json(body))
}

pub async fn data_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = data_inner(&state).await;
    (status, Json(body))
}

pub async fn conversations_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = conversations_inner(&state).await;
    (status, Json(body))
}

pub async fn submit_workout_handler(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> impl IntoResponse {
    let (status, body) = submit_workout_inner(&state, &body).await;
    (status, Json(body))
}

pub async fn list_sessions_handler(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let (status, body) = list_sessions_inner(&state, params).await;
    (status, Json(body))
}

pub async fn get_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let (status, body) = get_session_inner(&state, id).await;
    (status, Json(body))
}

pub async fn delete_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let (status, body) = delete_session_inner(&state, id).await;
    (status, Json(body))
}

pub async fn update_exercise_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> impl IntoResponse {
    let (status, body) = update_exercise_inner(&state, id, &body).await;
    (status, Json(body))
}

pub async fn delete_exercise_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let (status, body) = delete_exercise_inner(&state, id).await;
    (status, Json(body))
}

pub async fn weekly_summary_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = weekly_summary_inner(&state).await;
    (status, Json(body))
}

pub async fn monthly_summary_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = monthly_summary_inner(&state).await;
    (status, Json(body))
}

pub async fn export_handler(State(state): State<Arc<HttpState>>) -> Response {
    match export_inner(&state).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILENAME}\""),
                ),
            ],
            // BOM so spreadsheet apps detect UTF-8
            format!("\u{feff}{csv}"),
        )
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_core::config::DatabaseConfig;
    use liftlog_core::SqliteFeedBackend;

    async fn make_state() -> HttpState {
        let pool = liftlog_core::db::create_pool(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        let feeds = Feeds::new(Arc::new(SqliteFeedBackend::new(pool.clone())));
        HttpState::new(pool, feeds)
    }

    // ========================================================================
    // TEST 1: version_inner is pure and returns correct fields
    // ========================================================================
    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "liftlog/1");
    }

    // ========================================================================
    // TEST 2: status_for maps the error taxonomy
    // ========================================================================
    #[test]
    fn test_status_for_error_taxonomy() {
        assert_eq!(
            status_for(&LiftlogError::validation("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&LiftlogError::session_not_found(1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&LiftlogError::Database(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    // ========================================================================
    // TEST 3: parse_body — empty and malformed bodies are validation errors
    // ========================================================================
    #[test]
    fn test_parse_body_rejects_empty_and_malformed() {
        let empty = parse_body::<Value>(b"  ").unwrap_err();
        assert_eq!(empty.to_string(), NO_JSON_MESSAGE);

        let malformed = parse_body::<Value>(b"{oops").unwrap_err();
        assert!(matches!(malformed, LiftlogError::Validation(_)));

        let ok: Value = parse_body(br#"{"a": 1}"#).unwrap();
        assert_eq!(ok["a"], 1);
    }

    // ========================================================================
    // TEST 4: health_inner — in-memory DB is healthy
    // ========================================================================
    #[tokio::test]
    async fn test_health_inner_ok() {
        let state = make_state().await;
        let (status, body) = health_inner(&state.pool).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["sqlite"].is_string());
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    // ========================================================================
    // TEST 5: receive_inner — stores payload and logs success
    // ========================================================================
    #[tokio::test]
    async fn test_receive_inner_stores_and_logs() {
        let state = make_state().await;
        let (status, body) = receive_inner(&state, br#"{"message": "Hello from GPTs"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["received_data"]["message"], "Hello from GPTs");
        assert!(body["timestamp"].is_string());

        let (_, data) = data_inner(&state).await;
        assert_eq!(data["count"], 1);
        let (_, logs) = logs_inner(&state).await;
        assert_eq!(logs["records"][0]["event_type"], "receive_data");
        assert_eq!(logs["records"][0]["status"], "success");
    }

    // ========================================================================
    // TEST 6: receive_inner — JSON null is rejected and logged as error
    // ========================================================================
    #[tokio::test]
    async fn test_receive_inner_null_is_bad_request() {
        let state = make_state().await;
        let (status, body) = receive_inner(&state, b"null").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NO_JSON_MESSAGE);

        let (_, data) = data_inner(&state).await;
        assert_eq!(data["count"], 0);
        let (_, logs) = logs_inner(&state).await;
        assert_eq!(logs["records"][0]["status"], "error");
        assert_eq!(logs["records"][0]["error"], NO_JSON_MESSAGE);
    }

    // ========================================================================
    // TEST 7: conversation_inner — missing fields are rejected
    // ========================================================================
    #[tokio::test]
    async fn test_conversation_inner_requires_fields() {
        let state = make_state().await;
        let (status, _) = conversation_inner(&state, br#"{"user_input": "hi"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = conversation_inner(
            &state,
            br#"{"user_input": "hi", "conversation_summary": "greeting"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conversation_id"], "conv_1");

        let (_, convs) = conversations_inner(&state).await;
        assert_eq!(convs["count"], 1);
    }

    // ========================================================================
    // TEST 8: submit_workout_inner — missing date yields the required-fields error
    // ========================================================================
    #[tokio::test]
    async fn test_submit_workout_inner_missing_fields() {
        let state = make_state().await;
        let (status, body) =
            submit_workout_inner(&state, br#"{"exercises": [{"name": "Squat"}]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "date and exercises are required");
    }

    // ========================================================================
    // TEST 9: submit → get → update → delete round of a session
    // ========================================================================
    #[tokio::test]
    async fn test_workout_lifecycle_inner() {
        let state = make_state().await;
        let (status, body) = submit_workout_inner(
            &state,
            br#"{"date": "2024-01-01", "day_of_week": "Mon",
                 "exercises": [{"name": "Squat", "weight": 100, "reps": 5, "rest_pause_reps": 2}]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["exercises_count"], 1);
        assert_eq!(body["date"], "2024-01-01");
        let session_id = body["session_id"].as_i64().unwrap();

        let (status, session) = get_session_inner(&state, session_id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["exercises"][0]["weight"], "100");
        let exercise_id = session["exercises"][0]["id"].as_i64().unwrap();

        let (status, updated) = update_exercise_inner(&state, exercise_id, br#"{"reps": 12}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["exercise_id"], exercise_id);
        assert_eq!(updated["exercise"]["reps"], 12);
        assert_eq!(updated["exercise"]["rest_pause_reps"], 2);

        let (status, _) = delete_session_inner(&state, session_id).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get_session_inner(&state, session_id).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = delete_exercise_inner(&state, exercise_id).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // TEST 10: list_sessions_inner — limit is applied
    // ========================================================================
    #[tokio::test]
    async fn test_list_sessions_inner_limit() {
        let state = make_state().await;
        for day in 1..=3 {
            let body = format!(r#"{{"date": "2024-03-0{day}", "exercises": [{{"name": "Row"}}]}}"#);
            let (status, _) = submit_workout_inner(&state, body.as_bytes()).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = list_sessions_inner(&state, ListParams { limit: Some(2) }).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["sessions"][0]["date"], "2024-03-03");
    }

    // ========================================================================
    // TEST 11: export_inner — header plus one row per exercise
    // ========================================================================
    #[tokio::test]
    async fn test_export_inner_csv() {
        let state = make_state().await;
        let (status, _) = submit_workout_inner(
            &state,
            br#"{"date": "2024-01-01", "exercises": [{"name": "Squat", "rest_pause_reps": 5}, {"name": "Curl"}]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let csv = export_inner(&state).await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,day_of_week"));
        assert_eq!(lines[1], "2024/01/01,,,Squat,,,,5,,,");
        assert_eq!(lines[2], "2024/01/01,,,Curl,,,,,,,");
    }
}
