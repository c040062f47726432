use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub status: LogStatus,
    #[serde(default, alias = "data")]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LogRecord {
    pub fn success(event_type: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type: event_type.into(),
            status: LogStatus::Success,
            payload,
            error: None,
        }
    }

    pub fn error(event_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type: event_type.into(),
            status: LogStatus::Error,
            payload: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedDataRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "data")]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub timestamp: DateTime<Utc>,
    pub conversation_id: String,
    #[serde(alias = "data")]
    pub payload: serde_json::Value,
}
