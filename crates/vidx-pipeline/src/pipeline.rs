//! The pipeline and its collaborators.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::Instrument;

use vidx_indexer::VideoIndexer;
use vidx_insights::InsightsFlattener;
use vidx_storage::BlobStore;
use vidx_table::{InsightsRepository, RowStore, TrackerRepository};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::logging::StageLogger;
use crate::metrics::record_stage;

/// Runs pipeline stages against a blob store, a row store and an indexer.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) config: Arc<PipelineConfig>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) rows: Arc<dyn RowStore>,
    pub(crate) indexer: Arc<dyn VideoIndexer>,
    pub(crate) tracker: TrackerRepository,
    pub(crate) insights: InsightsRepository,
    pub(crate) flattener: InsightsFlattener,
    tracker_ready: Arc<OnceCell<()>>,
    insights_ready: Arc<OnceCell<()>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        blobs: Arc<dyn BlobStore>,
        rows: Arc<dyn RowStore>,
        indexer: Arc<dyn VideoIndexer>,
    ) -> Self {
        let tracker = TrackerRepository::new(
            Arc::clone(&rows),
            config.tracker_table.clone(),
            config.partition_key.clone(),
        );
        let insights = InsightsRepository::new(
            Arc::clone(&rows),
            config.insights_table.clone(),
            config.partition_key.clone(),
        );

        Self {
            config: Arc::new(config),
            blobs,
            rows,
            indexer,
            tracker,
            insights,
            flattener: InsightsFlattener::new(),
            tracker_ready: Arc::new(OnceCell::new()),
            insights_ready: Arc::new(OnceCell::new()),
        }
    }

    /// Replace the flattener, e.g. to track additional categories.
    pub fn with_flattener(mut self, flattener: InsightsFlattener) -> Self {
        self.flattener = flattener;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn blob_store(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn row_store(&self) -> &Arc<dyn RowStore> {
        &self.rows
    }

    /// Create the tracking table once per process.
    pub(crate) async fn ensure_tracker_table(&self) -> PipelineResult<()> {
        self.tracker_ready
            .get_or_try_init(|| async {
                self.tracker.ensure_table().await?;
                PipelineResult::Ok(())
            })
            .await?;
        Ok(())
    }

    /// Create the insights table once per process.
    pub(crate) async fn ensure_insights_table(&self) -> PipelineResult<()> {
        self.insights_ready
            .get_or_try_init(|| async {
                self.insights.ensure_table().await?;
                PipelineResult::Ok(())
            })
            .await?;
        Ok(())
    }

    /// Run one stage body inside the logger's span and record its outcome.
    pub(crate) async fn run_stage<T, F>(&self, logger: &StageLogger, fut: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        let start = Instant::now();
        let result = fut.instrument(logger.span()).await;
        record_stage(logger.stage(), result.is_ok(), start.elapsed());

        if let Err(e) = &result {
            logger.log_error(&e.to_string());
        }
        result
    }
}
