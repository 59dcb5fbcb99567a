//! Batched term canonicalization
//!
//! Splits unmapped terms into positional batches, classifies each batch
//! seeded with the live canonical vocabulary, and merges the results.
//! Canonical values minted by an earlier batch are visible to later
//! batches in the same run, so fresh synonyms converge instead of
//! re-minting.

use std::collections::{HashMap, HashSet};

use crate::services::classifier::Classifier;

/// Result of one canonicalization run over a term list.
#[derive(Debug, Default)]
pub struct CanonOutcome {
    /// Merged term -> canonical mappings from all successful batches
    pub mappings: HashMap<String, String>,
    /// True when at least one batch was skipped due to a failure
    pub partial: bool,
}

/// Splits terms into bounded batches and drives the classifier.
pub struct BatchCanonicalizer {
    batch_size: usize,
}

impl BatchCanonicalizer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Canonicalize `terms`, growing `preferred` in place with every new
    /// canonical value so the caller can carry the vocabulary forward.
    ///
    /// A failed batch is skipped (no partial credit for its terms) and
    /// flagged via `partial`; remaining batches still run. Empty input is
    /// a no-op without an external call.
    pub async fn canonicalize(
        &self,
        classifier: &dyn Classifier,
        terms: &[String],
        preferred: &mut Vec<String>,
    ) -> CanonOutcome {
        let mut outcome = CanonOutcome::default();
        if terms.is_empty() {
            return outcome;
        }

        let mut known: HashSet<String> = preferred.iter().cloned().collect();

        for (index, batch) in terms.chunks(self.batch_size).enumerate() {
            match classifier.classify(batch, preferred).await {
                Ok(batch_mappings) => {
                    // Walk the batch in input order so the vocabulary grows
                    // deterministically; keys outside this batch and empty
                    // canons are dropped
                    for term in batch {
                        let Some(canonical) = batch_mappings.get(term) else {
                            continue;
                        };
                        let canonical = canonical.trim().to_string();
                        if canonical.is_empty() {
                            continue;
                        }

                        if known.insert(canonical.clone()) {
                            preferred.push(canonical.clone());
                        }
                        outcome.mappings.insert(term.clone(), canonical);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index,
                        size = batch.len(),
                        error = %e,
                        "Classification batch failed, skipping"
                    );
                    outcome.partial = true;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classifier::ClassifyError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Stub that records batch shapes and maps any term containing
    /// "Glaub" to "Glaube", echoing other terms unchanged. Batches whose
    /// index is in `fail_batches` return an error.
    struct StubClassifier {
        calls: Mutex<Vec<(Vec<String>, Vec<String>)>>,
        fail_batches: Vec<usize>,
    }

    impl StubClassifier {
        fn new(fail_batches: Vec<usize>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_batches,
            }
        }

        fn calls(&self) -> Vec<(Vec<String>, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(
            &self,
            terms: &[String],
            preferred: &[String],
        ) -> Result<HashMap<String, String>, ClassifyError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((terms.to_vec(), preferred.to_vec()));
                calls.len() - 1
            };

            if self.fail_batches.contains(&index) {
                return Err(ClassifyError::Api(500, "simulated outage".to_string()));
            }

            Ok(terms
                .iter()
                .map(|t| {
                    let canonical = if t.contains("Glaub") {
                        "Glaube".to_string()
                    } else {
                        t.clone()
                    };
                    (t.clone(), canonical)
                })
                .collect())
        }
    }

    fn numbered_terms(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("term-{i:04}")).collect()
    }

    #[tokio::test]
    async fn empty_input_skips_the_classifier() {
        let stub = StubClassifier::new(vec![]);
        let canonicalizer = BatchCanonicalizer::new(500);
        let mut preferred = vec![];

        let outcome = canonicalizer.canonicalize(&stub, &[], &mut preferred).await;

        assert!(outcome.mappings.is_empty());
        assert!(!outcome.partial);
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn batches_are_positional_and_bounded() {
        let stub = StubClassifier::new(vec![]);
        let canonicalizer = BatchCanonicalizer::new(500);
        let terms = numbered_terms(1200);
        let mut preferred = vec![];

        let outcome = canonicalizer.canonicalize(&stub, &terms, &mut preferred).await;

        let calls = stub.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0.len(), 500);
        assert_eq!(calls[1].0.len(), 500);
        assert_eq!(calls[2].0.len(), 200);
        assert_eq!(calls[0].0, terms[..500].to_vec());
        assert_eq!(calls[2].0, terms[1000..].to_vec());
        assert_eq!(outcome.mappings.len(), 1200);
    }

    #[tokio::test]
    async fn canon_reuse_across_terms() {
        let stub = StubClassifier::new(vec![]);
        let canonicalizer = BatchCanonicalizer::new(500);
        let terms = vec!["Glauben".to_string(), "Glaube".to_string()];
        let mut preferred = vec!["Glaube".to_string()];

        let outcome = canonicalizer.canonicalize(&stub, &terms, &mut preferred).await;

        assert_eq!(outcome.mappings["Glauben"], "Glaube");
        assert_eq!(outcome.mappings["Glaube"], "Glaube");
        // Established canon is not duplicated into the vocabulary
        assert_eq!(preferred, vec!["Glaube".to_string()]);
    }

    #[tokio::test]
    async fn later_batches_see_canon_minted_earlier() {
        let stub = StubClassifier::new(vec![]);
        let canonicalizer = BatchCanonicalizer::new(2);
        let terms = vec![
            "Gnade".to_string(),
            "Hoffnung".to_string(),
            "Liebe".to_string(),
        ];
        let mut preferred = vec![];

        canonicalizer.canonicalize(&stub, &terms, &mut preferred).await;

        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        // Second batch was seeded with canons created by the first
        assert_eq!(calls[1].1, vec!["Gnade".to_string(), "Hoffnung".to_string()]);
        assert_eq!(
            preferred,
            vec![
                "Gnade".to_string(),
                "Hoffnung".to_string(),
                "Liebe".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn failed_batch_is_skipped_not_fatal() {
        let stub = StubClassifier::new(vec![1]);
        let canonicalizer = BatchCanonicalizer::new(500);
        let terms = numbered_terms(1200);
        let mut preferred = vec![];

        let outcome = canonicalizer.canonicalize(&stub, &terms, &mut preferred).await;

        assert!(outcome.partial);
        assert_eq!(outcome.mappings.len(), 700);
        assert!(outcome.mappings.contains_key("term-0000"));
        assert!(!outcome.mappings.contains_key("term-0500"), "batch 2 got no partial credit");
        assert!(outcome.mappings.contains_key("term-1000"));
    }

    #[tokio::test]
    async fn fully_failed_run_returns_empty_and_partial() {
        let stub = StubClassifier::new(vec![0, 1]);
        let canonicalizer = BatchCanonicalizer::new(2);
        let terms = numbered_terms(4);
        let mut preferred = vec![];

        let outcome = canonicalizer.canonicalize(&stub, &terms, &mut preferred).await;

        assert!(outcome.partial);
        assert!(outcome.mappings.is_empty());
    }

    /// Stub returning keys outside the batch and blank canons.
    struct NoisyClassifier;

    #[async_trait]
    impl Classifier for NoisyClassifier {
        async fn classify(
            &self,
            terms: &[String],
            _preferred: &[String],
        ) -> Result<HashMap<String, String>, ClassifyError> {
            let mut out: HashMap<String, String> = terms
                .iter()
                .map(|t| (t.clone(), t.to_uppercase()))
                .collect();
            out.insert("uninvited".to_string(), "Ghost".to_string());
            if let Some(first) = terms.first() {
                out.insert(first.clone(), "  ".to_string());
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn extra_keys_and_blank_canons_are_dropped() {
        let canonicalizer = BatchCanonicalizer::new(10);
        let terms = vec!["a".to_string(), "b".to_string()];
        let mut preferred = vec![];

        let outcome = canonicalizer
            .canonicalize(&NoisyClassifier, &terms, &mut preferred)
            .await;

        assert!(!outcome.mappings.contains_key("uninvited"));
        assert!(!outcome.mappings.contains_key("a"), "blank canonical dropped");
        assert_eq!(outcome.mappings["b"], "B");
    }
}
