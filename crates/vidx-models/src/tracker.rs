//! Upload tracking models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a video in the tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum VideoState {
    /// Submitted to the indexer, analysis not yet collected
    #[default]
    Uploaded,
    /// Artifacts and insights stored in blob storage
    Processed,
}

impl VideoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoState::Uploaded => "Uploaded",
            VideoState::Processed => "Processed",
        }
    }
}

impl fmt::Display for VideoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Uploaded" => Ok(VideoState::Uploaded),
            "Processed" => Ok(VideoState::Processed),
            other => Err(format!("unknown video state: {}", other)),
        }
    }
}

/// A video tracked through the pipeline, keyed by its indexer id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackedVideo {
    /// Id assigned by the video indexer on upload
    pub video_indexer_id: String,

    /// Video name (blob file stem)
    pub video_name: String,

    /// Blob path of the source video, `container/dir/file.ext`
    pub video_path: String,

    /// Fetchable URI of the source video
    pub video_url: String,

    /// Blob name of the stored insights document, once processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights_path: Option<String>,

    /// Current state
    #[serde(default)]
    pub state: VideoState,

    /// Last time this row was written by the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TrackedVideo {
    /// A freshly uploaded video.
    pub fn uploaded(
        video_indexer_id: impl Into<String>,
        video_name: impl Into<String>,
        video_path: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        Self {
            video_indexer_id: video_indexer_id.into(),
            video_name: video_name.into(),
            video_path: video_path.into(),
            video_url: video_url.into(),
            insights_path: None,
            state: VideoState::Uploaded,
            updated_at: Some(Utc::now()),
        }
    }

    /// Transition to `Processed`, recording where the insights were stored.
    pub fn into_processed(self, insights_path: impl Into<String>) -> Self {
        Self {
            insights_path: Some(insights_path.into()),
            state: VideoState::Processed,
            updated_at: Some(Utc::now()),
            ..self
        }
    }
}
