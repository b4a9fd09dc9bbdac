//! Video Indexer REST client.
//!
//! Uploads videos for analysis and downloads the resulting artifacts and
//! insights index. Pipeline code depends on the [`VideoIndexer`] trait.

pub mod client;
pub mod config;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod retry;
pub mod token_cache;

pub use client::VideoIndexerClient;
pub use config::IndexerConfig;
pub use error::{IndexerError, IndexerResult};
pub use indexer::{UploadRequest, UploadedVideo, VideoIndexer};
