//! Durable term -> canonical term mappings
//!
//! `term` is the primary key; the table is field-agnostic. Rows are only
//! ever created or overwritten by the canonicalization job (most recent
//! classification wins), never deleted here.

use ama_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

/// Upsert one mapping. Idempotent; a different canonical for an existing
/// term overwrites it.
pub async fn upsert(db: &SqlitePool, term: &str, canonical: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO category_mappings (term, canonical) VALUES (?, ?)
         ON CONFLICT(term) DO UPDATE SET canonical = excluded.canonical",
    )
    .bind(term)
    .bind(canonical)
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// Upsert a batch of mappings, logging and skipping per-row failures.
///
/// Returns the number of rows written. A single bad row must not abort
/// the remaining writes of a batch.
pub async fn upsert_all(db: &SqlitePool, mappings: &HashMap<String, String>) -> usize {
    let mut written = 0;
    for (term, canonical) in mappings {
        match upsert(db, term, canonical).await {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!(term = %term, error = %e, "Skipping mapping write");
            }
        }
    }
    written
}

/// Canonical value for a term, if one has been established.
pub async fn get(db: &SqlitePool, term: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT canonical FROM category_mappings WHERE term = ?")
            .bind(term)
            .fetch_optional(db)
            .await
            .map_err(Error::Database)?;

    Ok(row.map(|(canonical,)| canonical))
}

/// All mapped terms (the full key set).
pub async fn all_terms(db: &SqlitePool) -> Result<BTreeSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT term FROM category_mappings")
        .fetch_all(db)
        .await
        .map_err(Error::Database)?;

    Ok(rows.into_iter().map(|(term,)| term).collect())
}

/// Distinct canonical values across all rows (the established vocabulary).
pub async fn canonical_terms(db: &SqlitePool) -> Result<BTreeSet<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT canonical FROM category_mappings")
            .fetch_all(db)
            .await
            .map_err(Error::Database)?;

    Ok(rows.into_iter().map(|(canonical,)| canonical).collect())
}

/// The whole mapping table as a lookup map.
pub async fn all(db: &SqlitePool) -> Result<HashMap<String, String>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT term, canonical FROM category_mappings")
            .fetch_all(db)
            .await
            .map_err(Error::Database)?;

    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let pool = setup_test_db().await;

        upsert(&pool, "Glauben", "Glaube").await.unwrap();
        upsert(&pool, "Glauben", "Glaube").await.unwrap();

        assert_eq!(get(&pool, "Glauben").await.unwrap().as_deref(), Some("Glaube"));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM category_mappings WHERE term = 'Glauben'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1, "Should have exactly one row after repeat upsert");
    }

    #[tokio::test]
    async fn upsert_overwrites_canonical() {
        let pool = setup_test_db().await;

        upsert(&pool, "Glauben", "Glaube").await.unwrap();
        upsert(&pool, "Glauben", "Vertrauen").await.unwrap();

        assert_eq!(
            get(&pool, "Glauben").await.unwrap().as_deref(),
            Some("Vertrauen")
        );
    }

    #[tokio::test]
    async fn get_missing_term_is_none() {
        let pool = setup_test_db().await;
        assert_eq!(get(&pool, "nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn key_and_canonical_sets() {
        let pool = setup_test_db().await;

        upsert(&pool, "Glauben", "Glaube").await.unwrap();
        upsert(&pool, "Glaube", "Glaube").await.unwrap();
        upsert(&pool, "Gnade Gottes", "Gnade").await.unwrap();

        let terms: Vec<String> = all_terms(&pool).await.unwrap().into_iter().collect();
        assert_eq!(terms, vec!["Glaube", "Glauben", "Gnade Gottes"]);

        let canon: Vec<String> = canonical_terms(&pool).await.unwrap().into_iter().collect();
        assert_eq!(canon, vec!["Glaube", "Gnade"]);
    }

    #[tokio::test]
    async fn upsert_all_returns_written_count() {
        let pool = setup_test_db().await;

        let mut batch = HashMap::new();
        batch.insert("a".to_string(), "A".to_string());
        batch.insert("b".to_string(), "A".to_string());

        assert_eq!(upsert_all(&pool, &batch).await, 2);
        assert_eq!(get(&pool, "b").await.unwrap().as_deref(), Some("A"));
    }
}
