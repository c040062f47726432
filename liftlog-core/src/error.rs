use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiftlogError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LiftlogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn session_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "session",
            id,
        }
    }

    pub fn exercise_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "exercise",
            id,
        }
    }

    /// True for failures of the underlying store rather than of the caller's input.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Io(_) | Self::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LiftlogError>;
