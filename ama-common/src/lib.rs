//! Shared types for the AMA log services
//!
//! Holds the pieces both the canonicalization engine (ama-ce) and the
//! browsing UI service consume: the common error type, the registry of
//! tracked document fields, and the serde models exchanged over HTTP.

pub mod error;
pub mod fields;
pub mod models;

pub use error::{Error, Result};
