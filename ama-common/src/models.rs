//! Serde models shared between the canonicalization engine and its clients

use serde::{Deserialize, Serialize};

/// One entry of an aggregation result.
///
/// Results are ordered by count descending, then key ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub key: String,
    pub count: i64,
}

/// Which side of the bipartite tag graph a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Source,
    Target,
}

/// Node of the co-occurrence graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub kind: NodeKind,
}

/// Weighted edge between a source-side and a target-side tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub weight: i64,
}

/// The materialized bipartite co-occurrence graph.
///
/// Nodes are sorted by (kind, id) and edges by weight descending then
/// (source, target) ascending, so a rebuilt graph is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

/// Lifecycle state of the canonicalization job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Running,
    Finished,
    Failed,
}

/// Snapshot of the process-wide canonicalization job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    pub message: String,
    pub completed_fields: usize,
    pub total_fields: usize,
}
