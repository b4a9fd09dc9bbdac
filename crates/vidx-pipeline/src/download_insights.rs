//! DownloadInsights: store a finished video's artifacts and insights index.

use serde::Serialize;
use vidx_models::{ArtifactType, BlobPath, VideoState};
use vidx_storage::put_json;

use crate::error::{PipelineError, PipelineResult};
use crate::logging::{Stage, StageLogger};
use crate::metrics::record_artifact;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadInsightsSummary {
    pub video_indexer_id: String,
    /// Blob paths of the stored artifacts
    pub artifacts_stored: Vec<String>,
    /// Artifacts that could not be fetched or stored, with the reason
    pub artifacts_skipped: Vec<(ArtifactType, String)>,
    /// Blob path of the stored insights index
    pub insights_path: String,
    pub state: VideoState,
}

/// Where an artifact of the video at `video` is stored: next to the video,
/// named `{video name without extension}_{Artifact}.json`.
pub fn artifact_path(video: &BlobPath, artifact: ArtifactType) -> BlobPath {
    video.with_name(format!("{}_{}.json", video.name_without_extension(), artifact))
}

/// Blob name of the insights index for a video registered as `video_name`.
pub fn insights_blob_name(video_name: &str) -> String {
    format!("{}_Insights.json", video_name)
}

impl Pipeline {
    /// Fetch every configured artifact and the insights index for a tracked
    /// video, store them beside the video, and mark the video `Processed`.
    ///
    /// A missing artifact is logged and skipped. Failing to fetch or store
    /// the index fails the stage and leaves the tracking row untouched.
    pub async fn download_insights(
        &self,
        video_indexer_id: &str,
    ) -> PipelineResult<DownloadInsightsSummary> {
        let logger = StageLogger::new(Stage::DownloadInsights, video_indexer_id);

        self.run_stage(&logger, async {
            if video_indexer_id.trim().is_empty() {
                return Err(PipelineError::invalid_input("id is required"));
            }
            logger.log_start("looking up tracked video");

            let video = self
                .tracker
                .find_by_indexer_id(video_indexer_id)
                .await?
                .ok_or_else(|| PipelineError::VideoNotFound(video_indexer_id.to_string()))?;
            let source = BlobPath::parse(&video.video_path)?;

            let mut artifacts_stored = Vec::new();
            let mut artifacts_skipped = Vec::new();

            for &artifact in &self.config.artifacts {
                let target = artifact_path(&source, artifact);

                let stored = match self.indexer.get_artifact(video_indexer_id, artifact).await {
                    Ok(value) => put_json(self.blobs.as_ref(), &target, &value)
                        .await
                        .map_err(PipelineError::from),
                    Err(e) => Err(e.into()),
                };

                match stored {
                    Ok(()) => {
                        record_artifact(true);
                        artifacts_stored.push(target.to_string());
                    }
                    Err(e) => {
                        record_artifact(false);
                        logger.log_warning(&format!("artifact {} skipped: {}", artifact, e));
                        artifacts_skipped.push((artifact, e.to_string()));
                    }
                }
            }
            logger.log_progress(&format!(
                "{} artifacts stored, {} skipped",
                artifacts_stored.len(),
                artifacts_skipped.len()
            ));

            let index = self.indexer.get_index(video_indexer_id).await?;
            let insights_name = insights_blob_name(&video.video_name);
            let insights_path = source.with_name(insights_name.clone());
            put_json(self.blobs.as_ref(), &insights_path, &index).await?;

            let processed = video.into_processed(insights_name);
            self.ensure_tracker_table().await?;
            self.tracker.upsert(&processed).await?;

            logger.log_completion(&format!("insights stored at {}", insights_path));
            Ok(DownloadInsightsSummary {
                video_indexer_id: processed.video_indexer_id,
                artifacts_stored,
                artifacts_skipped,
                insights_path: insights_path.to_string(),
                state: processed.state,
            })
        })
        .await
    }
}
