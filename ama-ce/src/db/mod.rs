//! Database access for ama-ce
//!
//! One SQLite database holds the schema-loose AMA log (`qa_log`), the
//! durable term mappings (`category_mappings`) and the materialized
//! network graph (`network_cache`).

pub mod documents;
pub mod mappings;
pub mod network;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the service database, creating file and tables as needed.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize ama-ce tables
///
/// Creates qa_log, category_mappings and network_cache if they don't exist.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // The AMA log itself. Documents are schema-loose JSON; the integer
    // rowid is the monotonically-ordered document identifier.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qa_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            body TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // term is the field-agnostic primary key: the same literal term at
    // two different field paths shares one mapping row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_mappings (
            term TEXT PRIMARY KEY,
            canonical TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS network_cache (
            id TEXT PRIMARY KEY,
            graph TEXT NOT NULL,
            built_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (qa_log, category_mappings, network_cache)");

    Ok(())
}
