//! Blob store abstraction.

use async_trait::async_trait;
use vidx_models::BlobPath;

use crate::error::StorageResult;

/// Information about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Container and object name
    pub path: BlobPath,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (milliseconds since epoch)
    pub last_modified: Option<u64>,
}

/// Hierarchical object storage keyed by `container/name`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path`, replacing any existing object.
    async fn put_blob(&self, path: &BlobPath, data: Vec<u8>, content_type: &str)
        -> StorageResult<()>;

    /// Fetch the object at `path`.
    async fn get_blob(&self, path: &BlobPath) -> StorageResult<Vec<u8>>;

    /// List every object in `container` whose name starts with `prefix`.
    async fn list_blobs(&self, container: &str, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Verify the container is reachable.
    async fn check_connectivity(&self, container: &str) -> StorageResult<()>;
}
