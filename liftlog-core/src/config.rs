use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LiftlogConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub feeds: FeedConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Where the bounded feeds keep their documents.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedBackendKind {
    /// One JSON file per feed under `feeds.dir`.
    File,
    /// One row per feed in the workout database.
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub backend: FeedBackendKind,
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl LiftlogConfig {
    /// Load `path` (optional) layered under `LIFTLOG__SECTION__KEY` env vars.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("service.log_level", "info")?
            .set_default("database.url", "sqlite://data/liftlog.db")?
            .set_default("database.max_connections", 5)?
            .set_default("feeds.backend", "file")?
            .set_default("feeds.dir", "data")?
            .set_default("http.host", "0.0.0.0")?
            .set_default("http.port", 5000)?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LIFTLOG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }
}
