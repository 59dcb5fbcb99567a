//! Unmapped term detection
//!
//! Computes, per tracked field, the distinct source values that have no
//! row in the mapping table yet. The mapped key set is global, not
//! field-scoped, matching the field-agnostic mapping table.

use ama_common::fields::FieldSpec;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

use crate::db::{documents, mappings};

/// Distinct terms at `field` that are not yet mapped.
///
/// Store failures degrade rather than abort: a failed source query yields
/// the empty set, a failed mapping query is treated as "no mappings", so
/// a transient error on one field never stops the others.
pub async fn detect(db: &SqlitePool, field: &FieldSpec) -> BTreeSet<String> {
    let source_terms = match documents::distinct_field_values(db, field.path).await {
        Ok(terms) => terms,
        Err(e) => {
            tracing::warn!(field = field.key, error = %e, "Fetching source terms failed");
            return BTreeSet::new();
        }
    };

    let mapped_terms = match mappings::all_terms(db).await {
        Ok(terms) => terms,
        Err(e) => {
            tracing::warn!(field = field.key, error = %e, "Fetching mapped terms failed, assuming none");
            BTreeSet::new()
        }
    };

    let unmapped: BTreeSet<String> = source_terms
        .difference(&mapped_terms)
        .cloned()
        .collect();

    tracing::info!(
        field = field.key,
        source = source_terms.len(),
        mapped = mapped_terms.len(),
        unmapped = unmapped.len(),
        "Analyzed field"
    );

    unmapped
}
