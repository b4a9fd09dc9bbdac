//! Video insights pipeline.
//!
//! This crate provides the four stages that move a video from a new blob to
//! rows in the insights table:
//! - Blob notification: derive upload parameters from a new blob
//! - PutVideo: submit the video to the indexer and start tracking it
//! - DownloadInsights: store the indexer's artifacts and insights index
//! - ProcessInsights: flatten stored insights into table rows
//!
//! Stages talk to storage, the row store and the indexer only through the
//! `BlobStore`, `RowStore` and `VideoIndexer` traits.

pub mod blob_event;
pub mod config;
pub mod download_insights;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod process_insights;
pub mod put_video;

#[cfg(test)]
mod test_support;

pub use blob_event::{BlobEvent, BlobEventOutcome};
pub use config::PipelineConfig;
pub use download_insights::DownloadInsightsSummary;
pub use error::{PipelineError, PipelineResult};
pub use logging::{Stage, StageLogger};
pub use pipeline::Pipeline;
pub use process_insights::ProcessInsightsSummary;
pub use put_video::{PutVideoRequest, PutVideoSummary};
