//! Bounded append-only feeds
//!
//! Each feed is a JSON array stored under its own key and capped at
//! [`FEED_RETENTION`] records. Appending loads the whole sequence, pushes the
//! new record, drops from the front, and writes everything back.
//!
//! Reads never fail: a missing, unreadable, or corrupt document is treated as
//! an empty feed and the next append starts over. Writes do fail loudly.
//! There is no locking, so two concurrent appends to the same feed can lose
//! one of the records.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::{FeedBackendKind, FeedConfig};
use crate::error::{LiftlogError, Result};
use crate::models::feed::{ConversationRecord, LogRecord, ReceivedDataRecord};

/// Hard cap on records kept per feed.
pub const FEED_RETENTION: usize = 100;

pub const LOGS_KEY: &str = "logs";
pub const RECEIVED_DATA_KEY: &str = "received_data";
pub const CONVERSATIONS_KEY: &str = "conversations";

/// Raw document storage behind a feed. One document per key.
#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// `Ok(None)` when nothing has been written under `key` yet.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document under `key`. Readers see the old or the new body, never a mix.
    async fn write(&self, key: &str, body: &str) -> Result<()>;
}

/// One `<key>.json` file per feed under a root directory.
#[derive(Debug, Clone)]
pub struct FileFeedBackend {
    root: PathBuf,
}

impl FileFeedBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        tracing::info!("File feed backend at {}", root.display());
        Ok(Self { root })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl FeedBackend for FileFeedBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, body: &str) -> Result<()> {
        let path = self.path_for(key);
        // unique per writer so racing appends never share a temp file
        let temp_path = self
            .root
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4().simple()));

        tokio::fs::write(&temp_path, body).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// One row per feed in the `feed_documents` table.
#[derive(Debug, Clone)]
pub struct SqliteFeedBackend {
    pool: SqlitePool,
}

impl SqliteFeedBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedBackend for SqliteFeedBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM feed_documents WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(body,)| body))
    }

    async fn write(&self, key: &str, body: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feed_documents (key, body, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// A typed, retention-capped view over one backend key.
pub struct BoundedFeed<T> {
    key: &'static str,
    backend: Arc<dyn FeedBackend>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for BoundedFeed<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            backend: Arc::clone(&self.backend),
            _record: PhantomData,
        }
    }
}

impl<T> BoundedFeed<T>
where
    T: Serialize + DeserializeOwned + Clone + Send,
{
    pub fn new(key: &'static str, backend: Arc<dyn FeedBackend>) -> Self {
        Self {
            key,
            backend,
            _record: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Retained records, oldest first.
    pub async fn list(&self) -> Vec<T> {
        self.load().await
    }

    pub async fn list_newest_first(&self) -> Vec<T> {
        let mut records = self.load().await;
        records.reverse();
        records
    }

    pub async fn append(&self, record: T) -> Result<()> {
        self.append_with(|_| record).await?;
        Ok(())
    }

    /// Append a record built from the currently retained sequence.
    pub async fn append_with<F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(&[T]) -> T + Send,
    {
        let mut records = self.load().await;
        let record = build(&records);
        records.push(record.clone());

        if records.len() > FEED_RETENTION {
            let overflow = records.len() - FEED_RETENTION;
            records.drain(..overflow);
        }

        let body = serde_json::to_string_pretty(&records)?;
        self.backend.write(self.key, &body).await?;
        Ok(record)
    }

    async fn load(&self) -> Vec<T> {
        let body = match self.backend.read(self.key).await {
            Ok(Some(body)) => body,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(feed = self.key, error = %e, "Feed unreadable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&body) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(feed = self.key, error = %e, "Feed corrupt, starting empty");
                Vec::new()
            }
        }
    }
}

/// The three feeds the service keeps, sharing one backend.
#[derive(Clone)]
pub struct Feeds {
    pub logs: BoundedFeed<LogRecord>,
    pub received: BoundedFeed<ReceivedDataRecord>,
    pub conversations: BoundedFeed<ConversationRecord>,
}

impl Feeds {
    pub fn new(backend: Arc<dyn FeedBackend>) -> Self {
        Self {
            logs: BoundedFeed::new(LOGS_KEY, Arc::clone(&backend)),
            received: BoundedFeed::new(RECEIVED_DATA_KEY, Arc::clone(&backend)),
            conversations: BoundedFeed::new(CONVERSATIONS_KEY, backend),
        }
    }

    pub fn from_config(config: &FeedConfig, pool: &SqlitePool) -> Result<Self> {
        let backend: Arc<dyn FeedBackend> = match config.backend {
            FeedBackendKind::File => Arc::new(FileFeedBackend::new(&config.dir)?),
            FeedBackendKind::Sqlite => Arc::new(SqliteFeedBackend::new(pool.clone())),
        };
        Ok(Self::new(backend))
    }

    pub async fn log_success(
        &self,
        event_type: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<()> {
        self.logs.append(LogRecord::success(event_type, payload)).await
    }

    pub async fn log_error(&self, event_type: &str, error: &str) -> Result<()> {
        self.logs.append(LogRecord::error(event_type, error)).await
    }

    pub async fn receive(&self, payload: serde_json::Value) -> Result<ReceivedDataRecord> {
        let record = ReceivedDataRecord {
            timestamp: Utc::now(),
            payload,
        };
        self.received.append(record.clone()).await?;
        Ok(record)
    }

    /// Store a conversation payload; it must carry `user_input` and `conversation_summary`.
    pub async fn record_conversation(
        &self,
        payload: serde_json::Value,
    ) -> Result<ConversationRecord> {
        let has = |field: &str| payload.get(field).is_some_and(|v| !v.is_null());
        if !has("user_input") || !has("conversation_summary") {
            return Err(LiftlogError::validation(
                "user_input and conversation_summary are required",
            ));
        }

        let supplied_id = payload
            .get("conversation_id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        self.conversations
            .append_with(move |existing| ConversationRecord {
                timestamp: Utc::now(),
                conversation_id: supplied_id
                    .unwrap_or_else(|| format!("conv_{}", next_conversation_ordinal(existing))),
                payload,
            })
            .await
    }
}

/// One past the highest `conv_<n>` still retained, so ids keep climbing after eviction.
fn next_conversation_ordinal(existing: &[ConversationRecord]) -> usize {
    existing
        .iter()
        .filter_map(|r| r.conversation_id.strip_prefix("conv_"))
        .filter_map(|n| n.parse::<usize>().ok())
        .max()
        .map_or(existing.len(), |n| n.max(existing.len()))
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::models::feed::LogStatus;
    use serde_json::json;

    fn file_feeds() -> (tempfile::TempDir, FileFeedBackend, Feeds) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileFeedBackend::new(dir.path()).unwrap();
        let feeds = Feeds::new(Arc::new(backend.clone()));
        (dir, backend, feeds)
    }

    // ========================================================================
    // Retention
    // ========================================================================

    #[tokio::test]
    async fn test_feed_keeps_everything_below_cap() {
        let (_dir, _backend, feeds) = file_feeds();
        for i in 0..5 {
            feeds.receive(json!({ "n": i })).await.unwrap();
        }
        let records = feeds.received.list().await;
        assert_eq!(records.len(), 5);
        let ns: Vec<i64> = records.iter().map(|r| r.payload["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_feed_evicts_oldest_past_cap() {
        let (_dir, _backend, feeds) = file_feeds();
        let total = FEED_RETENTION + 7;
        for i in 0..total {
            feeds.receive(json!({ "n": i })).await.unwrap();
        }

        let records = feeds.received.list().await;
        assert_eq!(records.len(), FEED_RETENTION);
        let ns: Vec<usize> = records
            .iter()
            .map(|r| r.payload["n"].as_u64().unwrap() as usize)
            .collect();
        let expected: Vec<usize> = (total - FEED_RETENTION..total).collect();
        assert_eq!(ns, expected);
    }

    #[tokio::test]
    async fn test_newest_first_reverses_order() {
        let (_dir, _backend, feeds) = file_feeds();
        feeds.log_success("first", None).await.unwrap();
        feeds.log_error("second", "bad input").await.unwrap();

        let records = feeds.logs.list_newest_first().await;
        assert_eq!(records[0].event_type, "second");
        assert_eq!(records[0].status, LogStatus::Error);
        assert_eq!(records[1].event_type, "first");
    }

    // ========================================================================
    // Read resilience
    // ========================================================================

    #[tokio::test]
    async fn test_corrupt_file_is_treated_as_empty() {
        let (_dir, backend, feeds) = file_feeds();
        feeds.log_success("before", None).await.unwrap();
        std::fs::write(backend.path_for(LOGS_KEY), "{not json").unwrap();

        assert!(feeds.logs.list().await.is_empty());
        feeds.log_success("after", None).await.unwrap();

        let records = feeds.logs.list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "after");
    }

    #[tokio::test]
    async fn test_unreadable_document_is_treated_as_empty() {
        let (_dir, backend, feeds) = file_feeds();
        // a directory where the file should be makes every read fail
        std::fs::create_dir(backend.path_for(RECEIVED_DATA_KEY)).unwrap();
        assert!(feeds.received.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let (_dir, backend, feeds) = file_feeds();
        std::fs::create_dir(backend.path_for(RECEIVED_DATA_KEY)).unwrap();
        assert!(feeds.receive(json!({"x": 1})).await.is_err());
    }

    #[tokio::test]
    async fn test_feeds_are_independent() {
        let (_dir, _backend, feeds) = file_feeds();
        feeds.receive(json!({"a": 1})).await.unwrap();
        feeds.log_success("receive_data", Some(json!({"a": 1}))).await.unwrap();

        assert_eq!(feeds.received.list().await.len(), 1);
        assert_eq!(feeds.logs.list().await.len(), 1);
        assert!(feeds.conversations.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (dir, _backend, feeds) = file_feeds();
        for i in 0..3 {
            feeds.receive(json!({ "n": i })).await.unwrap();
        }
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    #[tokio::test]
    async fn test_conversation_requires_fields() {
        let (_dir, _backend, feeds) = file_feeds();
        let err = feeds
            .record_conversation(json!({"user_input": "hi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, LiftlogError::Validation(_)));
        assert!(feeds.conversations.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_ids_default_to_sequence() {
        let (_dir, _backend, feeds) = file_feeds();
        let payload = || json!({"user_input": "q", "conversation_summary": "s"});

        let first = feeds.record_conversation(payload()).await.unwrap();
        let second = feeds.record_conversation(payload()).await.unwrap();
        let named = feeds
            .record_conversation(json!({
                "user_input": "q",
                "conversation_summary": "s",
                "conversation_id": "chat-42"
            }))
            .await
            .unwrap();

        assert_eq!(first.conversation_id, "conv_1");
        assert_eq!(second.conversation_id, "conv_2");
        assert_eq!(named.conversation_id, "chat-42");
    }

    #[test]
    fn test_conversation_ordinal_survives_eviction() {
        let record = |id: &str| ConversationRecord {
            timestamp: Utc::now(),
            conversation_id: id.to_string(),
            payload: json!({}),
        };
        let existing = vec![record("conv_150"), record("chat-x"), record("conv_151")];
        assert_eq!(next_conversation_ordinal(&existing), 152);
        assert_eq!(next_conversation_ordinal(&[]), 1);
    }

    // ========================================================================
    // SQLite backend
    // ========================================================================

    #[tokio::test]
    async fn test_sqlite_backend_round_trips_and_caps() {
        let pool = crate::db::create_pool(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        let feeds = Feeds::new(Arc::new(SqliteFeedBackend::new(pool.clone())));

        for i in 0..(FEED_RETENTION + 1) {
            feeds.log_success("tick", Some(json!({ "n": i }))).await.unwrap();
        }
        let records = feeds.logs.list().await;
        assert_eq!(records.len(), FEED_RETENTION);
        assert_eq!(records[0].payload, Some(json!({"n": 1})));

        let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feed_documents")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows.0, 1);
    }

    #[tokio::test]
    async fn test_sqlite_backend_corrupt_row_is_treated_as_empty() {
        let pool = crate::db::create_pool(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        let backend = SqliteFeedBackend::new(pool);
        backend.write(RECEIVED_DATA_KEY, "[{\"broken\"").await.unwrap();

        let feeds = Feeds::new(Arc::new(backend));
        feeds.receive(json!({"ok": true})).await.unwrap();
        assert_eq!(feeds.received.list().await.len(), 1);
    }
}
