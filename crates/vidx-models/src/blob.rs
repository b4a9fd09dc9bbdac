//! Hierarchical blob paths.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from parsing a blob path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobPathError {
    #[error("Blob path is empty")]
    Empty,

    #[error("Blob path has no object name after the container: {0}")]
    MissingName(String),
}

/// A blob addressed as `container/name`, where `name` may itself contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct BlobPath {
    pub container: String,
    pub name: String,
}

impl BlobPath {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }

    /// Parse `container/dir/file.ext`. Leading slashes are ignored.
    pub fn parse(path: &str) -> Result<Self, BlobPathError> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(BlobPathError::Empty);
        }

        match trimmed.split_once('/') {
            Some((container, name)) if !container.is_empty() && !name.is_empty() => {
                Ok(Self::new(container, name))
            }
            _ => Err(BlobPathError::MissingName(path.to_string())),
        }
    }

    /// Last path segment of the object name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// File name without its extension.
    pub fn file_stem(&self) -> &str {
        let file = self.file_name();
        match file.rfind('.') {
            Some(0) | None => file,
            Some(idx) => &file[..idx],
        }
    }

    /// Object name without its extension, keeping any directories.
    pub fn name_without_extension(&self) -> &str {
        let file_start = self.name.len() - self.file_name().len();
        match self.file_name().rfind('.') {
            Some(0) | None => &self.name,
            Some(idx) => &self.name[..file_start + idx],
        }
    }

    /// Sibling object in the same container.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::new(self.container.clone(), name)
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}
