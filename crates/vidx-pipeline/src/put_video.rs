//! PutVideo: submit a stored video to the indexer and start tracking it.

use serde::{Deserialize, Serialize};
use vidx_indexer::UploadRequest;
use vidx_models::{BlobPath, TrackedVideo, VideoState};

use crate::error::{PipelineError, PipelineResult};
use crate::logging::{Stage, StageLogger};
use crate::pipeline::Pipeline;

/// Parameters of one PutVideo run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutVideoRequest {
    /// Blob path of the video, `container/dir/file.ext`
    pub path: String,
    /// Name to register the video under
    pub name: String,
    /// URI the indexer fetches the video from
    pub uri: String,
}

impl PutVideoRequest {
    fn validate(&self) -> PipelineResult<BlobPath> {
        for (field, value) in [("path", &self.path), ("name", &self.name), ("uri", &self.uri)] {
            if value.trim().is_empty() {
                return Err(PipelineError::invalid_input(format!("{} is required", field)));
            }
        }
        Ok(BlobPath::parse(&self.path)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PutVideoSummary {
    pub video_indexer_id: String,
    pub video_name: String,
    pub video_path: String,
    pub state: VideoState,
}

impl Pipeline {
    /// Upload the video to the indexer, then record it as `Uploaded`.
    ///
    /// Re-running with the same input submits the video again and rewrites
    /// the tracking row under the newly assigned id.
    pub async fn put_video(&self, request: &PutVideoRequest) -> PipelineResult<PutVideoSummary> {
        let logger = StageLogger::new(Stage::PutVideo, &request.path);

        self.run_stage(&logger, async {
            request.validate()?;
            logger.log_start(&format!("submitting {} to indexer", request.name));

            let uploaded = self
                .indexer
                .upload_video(&UploadRequest::new(&request.name, &request.uri))
                .await?;
            logger.log_progress(&format!("indexer assigned id {}", uploaded.id));

            let video =
                TrackedVideo::uploaded(&uploaded.id, &request.name, &request.path, &request.uri);
            self.ensure_tracker_table().await?;
            self.tracker.upsert(&video).await?;

            logger.log_completion(&format!(
                "tracking {} as {}",
                video.video_indexer_id, video.state
            ));
            Ok(PutVideoSummary {
                video_indexer_id: video.video_indexer_id,
                video_name: video.video_name,
                video_path: video.video_path,
                state: video.state,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness, uploaded};

    fn request() -> PutVideoRequest {
        PutVideoRequest {
            path: "content/keynote.mp4".into(),
            name: "keynote".into(),
            uri: "https://blob.test/content/keynote.mp4".into(),
        }
    }

    #[tokio::test]
    async fn test_put_video_tracks_upload() {
        let mut h = harness();
        h.indexer
            .expect_upload_video()
            .withf(|r| {
                r.name == "keynote" && r.video_url == "https://blob.test/content/keynote.mp4"
            })
            .times(1)
            .returning(|_| Ok(uploaded("vi-42")));

        let pipeline = h.build();
        let summary = pipeline.put_video(&request()).await.unwrap();

        assert_eq!(summary.video_indexer_id, "vi-42");
        assert_eq!(summary.state, VideoState::Uploaded);

        let row = h.rows.row("tracker", "vi-42").unwrap();
        assert_eq!(row.get_str("VideoName"), Some("keynote"));
        assert_eq!(row.get_str("VideoPath"), Some("content/keynote.mp4"));
        assert_eq!(row.get_str("VideoUrl"), Some("https://blob.test/content/keynote.mp4"));
        assert_eq!(row.get_str("State"), Some("Uploaded"));
        assert_eq!(h.rows.tables_created(), vec!["tracker".to_string()]);
    }

    #[tokio::test]
    async fn test_put_video_rejects_missing_fields() {
        let mut h = harness();
        h.indexer.expect_upload_video().never();
        let pipeline = h.build();

        let mut bad = request();
        bad.uri = " ".into();
        let err = pipeline.put_video(&bad).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(ref m) if m.contains("uri")));

        let mut bad = request();
        bad.path = "keynote.mp4".into();
        assert!(matches!(
            pipeline.put_video(&bad).await,
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_put_video_indexer_failure_writes_nothing() {
        let mut h = harness();
        h.indexer
            .expect_upload_video()
            .returning(|_| Err(vidx_indexer::IndexerError::ServerError(500, "down".into())));

        let pipeline = h.build();
        let err = pipeline.put_video(&request()).await.unwrap_err();

        assert!(err.is_upstream());
        assert!(h.rows.row("tracker", "vi-42").is_none());
    }

    #[tokio::test]
    async fn test_tracker_table_created_once() {
        let mut h = harness();
        h.indexer.expect_upload_video().times(2).returning(|_| Ok(uploaded("vi-42")));

        let pipeline = h.build();
        pipeline.put_video(&request()).await.unwrap();
        pipeline.put_video(&request()).await.unwrap();

        assert_eq!(h.rows.tables_created().len(), 1);
    }
}
