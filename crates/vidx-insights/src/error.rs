//! Insights error types.

use thiserror::Error;

/// Result type for insights operations.
pub type InsightsResult<T> = Result<T, InsightsError>;

/// Errors raised for documents that break the caller contract.
///
/// Malformed category payloads are never reported here; they only
/// contribute zero records.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Document {source_ref} is not a JSON object")]
    NotAnObject { source_ref: String },

    #[error("Document {source_ref} is missing required field `{field}`")]
    MissingField {
        source_ref: String,
        field: &'static str,
    },

    #[error("Document {source_ref} has invalid field `{field}`: expected {expected}")]
    InvalidField {
        source_ref: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Index {source_ref} contains no videos")]
    EmptyIndex { source_ref: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightsError {
    pub fn missing_field(source_ref: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            source_ref: source_ref.into(),
            field,
        }
    }

    pub fn invalid_field(
        source_ref: impl Into<String>,
        field: &'static str,
        expected: &'static str,
    ) -> Self {
        Self::InvalidField {
            source_ref: source_ref.into(),
            field,
            expected,
        }
    }
}
