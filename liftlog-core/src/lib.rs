pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod feed;
pub mod models;
pub mod summary;
pub mod workout;

pub use config::LiftlogConfig;
pub use error::LiftlogError;
pub use export::{ExportRow, TabularExporter};
pub use feed::{
    BoundedFeed, FeedBackend, Feeds, FileFeedBackend, SqliteFeedBackend, FEED_RETENTION,
};
pub use summary::{MonthlySummary, SummaryAggregator, WeeklySummary};
pub use workout::WorkoutRepository;
