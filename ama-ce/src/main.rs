//! ama-ce - Canonicalization Engine for the AMA log
//!
//! Hosts the semantic term canonicalization job, the normalized
//! aggregation queries, and the materialized tag co-occurrence graph
//! over the shared AMA log database.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ama_ce::services::LlmClassifier;
use ama_ce::AppState;

#[derive(Debug, Parser)]
#[command(name = "ama-ce", about = "AMA log canonicalization engine")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = "AMA_CE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen port
    #[arg(long, env = "AMA_CE_PORT")]
    port: Option<u16>,

    /// Path to the SQLite database file
    #[arg(long, env = "AMA_CE_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting ama-ce (Canonicalization Engine)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Configuration is a startup precondition: a missing classifier key
    // fails here, not mid-run.
    let config = ama_ce::config::resolve(args.port, args.database, args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Database: {}", config.database.display());

    let db_pool = ama_ce::db::init_database_pool(&config.database).await?;
    info!("Database connection established");

    let classifier = LlmClassifier::new(&config.classifier)
        .map_err(|e| anyhow::anyhow!("Failed to create classifier client: {}", e))?;
    info!(
        model = %config.classifier.model,
        batch_size = config.classifier.batch_size,
        "Classifier client initialized"
    );

    let state = AppState::new(
        db_pool,
        Arc::new(classifier),
        config.classifier.batch_size,
    );

    let app = ama_ce::build_router(state);

    let listener =
        tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
