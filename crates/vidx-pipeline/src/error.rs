//! Pipeline error types.

use thiserror::Error;
use vidx_indexer::IndexerError;
use vidx_insights::InsightsError;
use vidx_models::BlobPathError;
use vidx_storage::StorageError;
use vidx_table::TableError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Video not tracked: {0}")]
    VideoNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Insights error: {0}")]
    Insights(#[from] InsightsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BlobPathError> for PipelineError {
    fn from(e: BlobPathError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Failure of an external collaborator rather than of the request.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PipelineError::Storage(_) | PipelineError::Table(_) | PipelineError::Indexer(_)
        )
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Table(e) => e.is_retryable(),
            PipelineError::Indexer(e) => e.is_retryable(),
            PipelineError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_path_error_is_invalid_input() {
        let err: PipelineError = BlobPathError::Empty.into();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_upstream_classification() {
        let err: PipelineError = IndexerError::ServerError(502, "bad gateway".into()).into();
        assert!(err.is_upstream());
        assert!(err.is_retryable());

        let err: PipelineError = TableError::config_error("x").into();
        assert!(err.is_upstream());
        assert!(!err.is_retryable());

        assert!(!PipelineError::VideoNotFound("vi-1".into()).is_upstream());
    }
}
