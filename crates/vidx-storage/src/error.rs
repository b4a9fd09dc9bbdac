//! Blob storage errors.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob store misconfigured: {0}")]
    ConfigError(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Could not write blob {path}: {reason}")]
    PutFailed { path: String, reason: String },

    #[error("Could not read blob {path}: {reason}")]
    GetFailed { path: String, reason: String },

    #[error("Could not list container {container}: {reason}")]
    ListFailed { container: String, reason: String },

    #[error("Blob store unreachable: {0}")]
    Unreachable(String),

    #[error("Blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Transport-level failures; a missing blob or bad content is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::PutFailed { .. }
                | StorageError::GetFailed { .. }
                | StorageError::ListFailed { .. }
                | StorageError::Unreachable(_)
        )
    }
}
