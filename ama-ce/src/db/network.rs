//! Materialized network graph persistence
//!
//! A single row under a fixed sentinel id holds the last successfully
//! rebuilt graph as JSON. Replacement is delete-then-insert with no
//! transaction: between the two steps readers observe "not yet built",
//! never a partially written graph.

use ama_common::models::NetworkGraph;
use ama_common::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;

const CACHE_ID: &str = "current";

/// Replace the cached graph wholesale.
pub async fn replace(db: &SqlitePool, graph: &NetworkGraph) -> Result<()> {
    let body = serde_json::to_string(graph)
        .map_err(|e| Error::Internal(format!("Serialize network graph failed: {}", e)))?;

    sqlx::query("DELETE FROM network_cache")
        .execute(db)
        .await
        .map_err(Error::Database)?;

    sqlx::query("INSERT INTO network_cache (id, graph, built_at) VALUES (?, ?, ?)")
        .bind(CACHE_ID)
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(db)
        .await
        .map_err(Error::Database)?;

    Ok(())
}

/// The last successfully rebuilt graph, or None if never built.
pub async fn read(db: &SqlitePool) -> Result<Option<NetworkGraph>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT graph FROM network_cache WHERE id = ?")
            .bind(CACHE_ID)
            .fetch_optional(db)
            .await
            .map_err(Error::Database)?;

    match row {
        Some((body,)) => {
            let graph = serde_json::from_str(&body)
                .map_err(|e| Error::Internal(format!("Parse cached network graph failed: {}", e)))?;
            Ok(Some(graph))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ama_common::models::{NetworkEdge, NetworkNode, NodeKind};
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

    fn sample_graph(weight: i64) -> NetworkGraph {
        NetworkGraph {
            nodes: vec![
                NetworkNode {
                    id: "John 3:16".to_string(),
                    kind: NodeKind::Source,
                },
                NetworkNode {
                    id: "Gnade".to_string(),
                    kind: NodeKind::Target,
                },
            ],
            edges: vec![NetworkEdge {
                source: "John 3:16".to_string(),
                target: "Gnade".to_string(),
                weight,
            }],
        }
    }

    #[tokio::test]
    async fn read_before_rebuild_is_none() {
        let pool = setup_test_db().await;
        assert_eq!(read(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_then_read_round_trips() {
        let pool = setup_test_db().await;

        let graph = sample_graph(2);
        replace(&pool, &graph).await.unwrap();

        assert_eq!(read(&pool).await.unwrap(), Some(graph));
    }

    #[tokio::test]
    async fn replace_keeps_a_single_row() {
        let pool = setup_test_db().await;

        replace(&pool, &sample_graph(1)).await.unwrap();
        replace(&pool, &sample_graph(5)).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM network_cache")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let cached = read(&pool).await.unwrap().unwrap();
        assert_eq!(cached.edges[0].weight, 5);
    }
}
