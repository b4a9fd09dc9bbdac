//! Indexer abstraction used by the pipeline stages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vidx_models::ArtifactType;

use crate::error::IndexerResult;

/// A video to submit for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Display name for the video in the indexer
    pub name: String,
    /// URL the indexer downloads the video from
    pub video_url: String,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            video_url: video_url.into(),
        }
    }
}

/// The indexer's record of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedVideo {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Processing state reported at upload time, e.g. `Uploaded`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[async_trait]
pub trait VideoIndexer: Send + Sync {
    /// Submit a video for indexing.
    async fn upload_video(&self, request: &UploadRequest) -> IndexerResult<UploadedVideo>;

    /// Download one analysis artifact as JSON.
    async fn get_artifact(&self, video_id: &str, artifact: ArtifactType) -> IndexerResult<Value>;

    /// Download the full insights index.
    async fn get_index(&self, video_id: &str) -> IndexerResult<Value>;
}
