//! HTTP API for the canonicalization engine

pub mod aggregation;
pub mod canonicalization;
pub mod health;

pub use aggregation::aggregation_routes;
pub use canonicalization::canonicalization_routes;
pub use health::health_routes;
