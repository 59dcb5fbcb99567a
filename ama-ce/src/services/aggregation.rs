//! Normalized aggregation over the AMA log
//!
//! Counts per value for a tracked field, optionally routed through the
//! mapping table, and the bipartite tag co-occurrence graph that feeds
//! the network cache.

use ama_common::fields::{self, FieldSpec};
use ama_common::models::{CountEntry, NetworkEdge, NetworkGraph, NetworkNode, NodeKind};
use ama_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::db::{documents, mappings};

/// Counts per value at `field`, sorted by count descending with key
/// ascending as the tie-break.
///
/// When `apply_mapping` is set, each row's value is normalized through
/// the mapping table before counting (falling back to the raw value), so
/// raw synonyms of one canonical term are counted together.
pub async fn aggregate(
    db: &SqlitePool,
    field: &FieldSpec,
    apply_mapping: bool,
) -> Result<Vec<CountEntry>> {
    let values = documents::field_values(db, field.path).await?;

    let mapping = if apply_mapping {
        mappings::all(db).await?
    } else {
        HashMap::new()
    };

    let mut counts: HashMap<String, i64> = HashMap::new();
    for value in values {
        let key = mapping.get(&value).cloned().unwrap_or(value);
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut result: Vec<CountEntry> = counts
        .into_iter()
        .map(|(key, count)| CountEntry { key, count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    Ok(result)
}

/// Build the bipartite co-occurrence graph between the source and target
/// tag namespaces.
///
/// For every document carrying at least one tag in each namespace, the
/// full cross product of (source, target) element pairs contributes 1 to
/// the pair's edge weight. Nodes are the union of endpoints that appear
/// in at least one edge.
pub async fn build_network_graph(db: &SqlitePool) -> Result<NetworkGraph> {
    let source_field = fields::field_by_key(fields::NETWORK_SOURCE_KEY)
        .ok_or_else(|| Error::Internal("network source field missing from registry".to_string()))?;
    let target_field = fields::field_by_key(fields::NETWORK_TARGET_KEY)
        .ok_or_else(|| Error::Internal("network target field missing from registry".to_string()))?;

    let pairs = documents::field_value_pairs(db, source_field.path, target_field.path).await?;

    let mut weights: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (sources, targets) in pairs {
        for source in &sources {
            for target in &targets {
                *weights
                    .entry((source.clone(), target.clone()))
                    .or_insert(0) += 1;
            }
        }
    }

    let mut source_ids: BTreeSet<&str> = BTreeSet::new();
    let mut target_ids: BTreeSet<&str> = BTreeSet::new();
    for (source, target) in weights.keys() {
        source_ids.insert(source);
        target_ids.insert(target);
    }

    let mut nodes: Vec<NetworkNode> = source_ids
        .into_iter()
        .map(|id| NetworkNode {
            id: id.to_string(),
            kind: NodeKind::Source,
        })
        .chain(target_ids.into_iter().map(|id| NetworkNode {
            id: id.to_string(),
            kind: NodeKind::Target,
        }))
        .collect();
    nodes.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));

    let mut edges: Vec<NetworkEdge> = weights
        .into_iter()
        .map(|((source, target), weight)| NetworkEdge {
            source,
            target,
            weight,
        })
        .collect();
    edges.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });

    Ok(NetworkGraph { nodes, edges })
}
