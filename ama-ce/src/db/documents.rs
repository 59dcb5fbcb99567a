//! Read access to the schema-loose AMA log documents
//!
//! Documents are stored as JSON text; projection uses SQLite's
//! `json_extract` with dotted paths from the field registry. A projected
//! value is either a scalar string or an array of strings; arrays are
//! unwound element-wise here, so every caller sees one candidate value
//! per element. Empty and non-string values are filtered out.

use ama_common::{Error, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// Insert a document into the log, returning its id.
pub async fn insert_document(db: &SqlitePool, body: &Value) -> Result<i64> {
    let result = sqlx::query("INSERT INTO qa_log (body) VALUES (?)")
        .bind(body.to_string())
        .execute(db)
        .await
        .map_err(Error::Database)?;

    Ok(result.last_insert_rowid())
}

/// All values observed at `path`, one entry per array element, in
/// document order. Empty strings are dropped.
pub async fn field_values(db: &SqlitePool, path: &str) -> Result<Vec<String>> {
    let json_path = json_path(path);
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT CAST(json_extract(body, ?) AS TEXT) FROM qa_log \
         WHERE json_extract(body, ?) IS NOT NULL \
         ORDER BY id",
    )
    .bind(&json_path)
    .bind(&json_path)
    .fetch_all(db)
    .await
    .map_err(Error::Database)?;

    Ok(rows
        .into_iter()
        .flat_map(|(raw,)| flatten_field(&raw))
        .collect())
}

/// Distinct values observed at `path`.
pub async fn distinct_field_values(db: &SqlitePool, path: &str) -> Result<BTreeSet<String>> {
    Ok(field_values(db, path).await?.into_iter().collect())
}

/// Per-document value pairs for two field paths, for documents where both
/// paths are present. Each side is already unwound to its element list.
pub async fn field_value_pairs(
    db: &SqlitePool,
    path_a: &str,
    path_b: &str,
) -> Result<Vec<(Vec<String>, Vec<String>)>> {
    let json_a = json_path(path_a);
    let json_b = json_path(path_b);
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT CAST(json_extract(body, ?) AS TEXT), CAST(json_extract(body, ?) AS TEXT) \
         FROM qa_log \
         WHERE json_extract(body, ?) IS NOT NULL AND json_extract(body, ?) IS NOT NULL \
         ORDER BY id",
    )
    .bind(&json_a)
    .bind(&json_b)
    .bind(&json_a)
    .bind(&json_b)
    .fetch_all(db)
    .await
    .map_err(Error::Database)?;

    Ok(rows
        .into_iter()
        .map(|(a, b)| (flatten_field(&a), flatten_field(&b)))
        .collect())
}

fn json_path(path: &str) -> String {
    format!("$.{}", path)
}

/// Turn a projected JSON value into candidate terms.
///
/// `json_extract` hands back array values as JSON text and string leaves
/// as bare text, so anything that fails to parse as JSON is a scalar.
fn flatten_field(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Ok(Value::Object(_)) | Ok(Value::Null) => Vec::new(),
        // Bare scalar text (the common case), or a scalar that happens to
        // parse as a JSON number/bool
        _ => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }
}
