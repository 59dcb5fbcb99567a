//! Service components of the canonicalization engine

pub mod aggregation;
pub mod canonicalizer;
pub mod classifier;
pub mod detector;
pub mod job;

pub use canonicalizer::{BatchCanonicalizer, CanonOutcome};
pub use classifier::{Classifier, ClassifyError, LlmClassifier};
pub use job::CanonicalizationJob;
