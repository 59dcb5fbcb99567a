//! Canonicalization job orchestration
//!
//! Drives detection and batch canonicalization across every canonicalized
//! field, in declared order, on a background task. The process-wide
//! `JobStatus` is the single-flight gate and the only channel of error
//! visibility: a field that saw a partial batch failure marks the whole
//! run `failed` at the end, but never stops the remaining fields.

use ama_common::fields;
use ama_common::models::{JobState, JobStatus};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::mappings;
use crate::services::canonicalizer::BatchCanonicalizer;
use crate::services::classifier::Classifier;
use crate::services::detector;

/// Process-wide canonicalization job handle.
///
/// Clones share one status cell; readers take consistent snapshots.
#[derive(Clone)]
pub struct CanonicalizationJob {
    status: Arc<RwLock<JobStatus>>,
}

impl CanonicalizationJob {
    pub fn new() -> Self {
        Self {
            status: Arc::new(RwLock::new(JobStatus {
                state: JobState::Idle,
                message: String::new(),
                completed_fields: 0,
                total_fields: fields::canonicalized_fields().count(),
            })),
        }
    }

    /// Current status snapshot.
    pub async fn snapshot(&self) -> JobStatus {
        self.status.read().await.clone()
    }

    /// Claim the single run slot.
    ///
    /// The check-and-set happens under the write lock, so two concurrent
    /// triggers cannot both start a run. Returns false when a run is
    /// already live; the caller reports the conflict without touching
    /// the running job's status.
    pub async fn try_start(&self) -> bool {
        let mut status = self.status.write().await;
        if status.state == JobState::Running {
            return false;
        }

        *status = JobStatus {
            state: JobState::Running,
            message: "Canonicalization run started".to_string(),
            completed_fields: 0,
            total_fields: fields::canonicalized_fields().count(),
        };
        true
    }

    /// Execute one run to its terminal state.
    ///
    /// Must only be called after a successful `try_start`. Never leaves
    /// the status stuck in `running`: any escaped error is recorded as
    /// the failure message.
    pub async fn run(
        &self,
        db: SqlitePool,
        classifier: Arc<dyn Classifier>,
        batch_size: usize,
    ) {
        let outcome = self.run_fields(&db, classifier.as_ref(), batch_size).await;

        let mut status = self.status.write().await;
        match outcome {
            Ok(0) => {
                status.state = JobState::Finished;
                status.message = format!(
                    "Canonicalization finished: {} fields processed",
                    status.total_fields
                );
                tracing::info!(fields = status.total_fields, "Canonicalization run finished");
            }
            Ok(failed_fields) => {
                status.state = JobState::Failed;
                status.message = format!(
                    "Canonicalization completed with errors: {} of {} fields had failures",
                    failed_fields, status.total_fields
                );
                tracing::warn!(
                    failed_fields,
                    total_fields = status.total_fields,
                    "Canonicalization run completed with errors"
                );
            }
            Err(e) => {
                status.state = JobState::Failed;
                status.message = format!("Canonicalization run failed: {}", e);
                tracing::error!(error = %e, "Canonicalization run failed");
            }
        }
    }

    /// Process all canonicalized fields, returning how many had errors.
    async fn run_fields(
        &self,
        db: &SqlitePool,
        classifier: &dyn Classifier,
        batch_size: usize,
    ) -> anyhow::Result<usize> {
        // Seed the vocabulary with every canonical term established so
        // far; it grows across fields within this run.
        let mut preferred: Vec<String> = mappings::canonical_terms(db)
            .await
            .map_err(|e| anyhow::anyhow!("Loading canonical vocabulary failed: {}", e))?
            .into_iter()
            .collect();

        let canonicalizer = BatchCanonicalizer::new(batch_size);
        let mut failed_fields = 0;

        for field in fields::canonicalized_fields() {
            let unmapped: Vec<String> = detector::detect(db, field).await.into_iter().collect();

            if !unmapped.is_empty() {
                let outcome = canonicalizer
                    .canonicalize(classifier, &unmapped, &mut preferred)
                    .await;
                let written = mappings::upsert_all(db, &outcome.mappings).await;

                tracing::info!(
                    field = field.key,
                    unmapped = unmapped.len(),
                    mapped = outcome.mappings.len(),
                    written,
                    partial = outcome.partial,
                    "Field canonicalized"
                );

                if outcome.partial {
                    failed_fields += 1;
                }
            }

            let mut status = self.status.write().await;
            status.completed_fields += 1;
        }

        Ok(failed_fields)
    }
}

impl Default for CanonicalizationJob {
    fn default() -> Self {
        Self::new()
    }
}
