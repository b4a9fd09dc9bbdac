//! Flattening of Video Indexer insights into normalized records.
//!
//! This crate provides:
//! - The category table mapping each feature category to its extraction shape
//! - Per-shape extraction of `(value, confidence)` pairs
//! - Validation of raw documents and indexer payloads
//! - The flattener itself, with a strict confidence floor
//!
//! Everything here is pure: no I/O and no logging. Callers decide what to
//! report.

pub mod category;
pub mod document;
pub mod error;
pub mod extract;
pub mod flatten;

pub use category::{CategoryRule, ExtractionShape, DEFAULT_CATEGORIES};
pub use document::{document_from_index, document_from_value};
pub use error::{InsightsError, InsightsResult};
pub use flatten::{apply_confidence_floor, flatten, InsightsFlattener};
