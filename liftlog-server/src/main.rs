use clap::Parser;
use liftlog_core::{Feeds, LiftlogConfig};
use serde_json::json;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use liftlog_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "liftlog.toml")]
    config: String,

    /// Check the database connection and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match LiftlogConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .init();

    // Connect to DB
    let pool = match liftlog_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.database.url, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match liftlog_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ SQLite connected: {}", v),
            Err(e) => {
                println!("❌ SQLite connection failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("✅ liftlog DB health check passed");
        return Ok(());
    }

    let feeds = Feeds::from_config(&config.feeds, &pool)?;
    if let Err(e) = feeds
        .log_success("app_start", Some(json!({ "message": "Application started" })))
        .await
    {
        tracing::warn!("Failed to record startup in log feed: {}", e);
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    let addr = format!("{}:{}", config.http.host, config.http.port);
    tracing::info!(
        database = %config.database.url,
        feeds = ?config.feeds.backend,
        "Starting liftlog server"
    );

    http::start_http_server(HttpState::new(pool, feeds), &addr, tx.subscribe()).await?;

    Ok(())
}
