//! Application state.

use std::sync::Arc;

use vidx_indexer::VideoIndexerClient;
use vidx_pipeline::{Pipeline, PipelineConfig};
use vidx_storage::S3BlobStore;
use vidx_table::AzureTableClient;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    /// Build the pipeline and its collaborators from the environment.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let pipeline_config = PipelineConfig::from_env()?;
        let blobs = S3BlobStore::from_env()?;
        let rows = AzureTableClient::from_env()?;
        let indexer = VideoIndexerClient::from_env()?;

        let pipeline = Pipeline::new(
            pipeline_config,
            Arc::new(blobs),
            Arc::new(rows),
            Arc::new(indexer),
        );

        Ok(Self::new(config, pipeline))
    }
}
