//! Blob notification: turn a newly created blob into a PutVideo run.

use serde::{Deserialize, Serialize};
use vidx_models::{ArtifactType, BlobPath};

use crate::error::PipelineResult;
use crate::logging::{Stage, StageLogger};
use crate::pipeline::Pipeline;
use crate::put_video::{PutVideoRequest, PutVideoSummary};

/// A blob-created notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEvent {
    /// Full blob path, `container/dir/file.ext`
    pub name: String,
    /// URI the blob can be fetched from
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BlobEventOutcome {
    Submitted(PutVideoSummary),
    /// The blob is a document this pipeline wrote itself.
    Skipped { path: String, reason: String },
}

/// PutVideo parameters for a new blob: the path as given, the file stem as
/// the video name, and the blob URI.
pub fn put_video_request(path: &BlobPath, uri: &str) -> PutVideoRequest {
    PutVideoRequest {
        path: path.to_string(),
        name: path.file_stem().to_string(),
        uri: uri.to_string(),
    }
}

/// True for the artifact and insights documents the pipeline stores next to
/// the videos. Submitting those would feed the pipeline its own output.
pub fn is_pipeline_output(path: &BlobPath) -> bool {
    let Some(stem) = path.file_name().strip_suffix(".json") else {
        return false;
    };

    stem.ends_with("_Insights")
        || ArtifactType::ALL
            .iter()
            .any(|artifact| stem.ends_with(&format!("_{}", artifact)))
}

impl Pipeline {
    pub async fn handle_blob_event(&self, event: &BlobEvent) -> PipelineResult<BlobEventOutcome> {
        let path = BlobPath::parse(&event.name)?;
        let logger = StageLogger::new(Stage::BlobEvent, path.to_string());

        if is_pipeline_output(&path) {
            logger.log_progress("pipeline output, not submitted");
            return Ok(BlobEventOutcome::Skipped {
                path: path.to_string(),
                reason: "pipeline output".to_string(),
            });
        }

        logger.log_start("new video blob");
        let summary = self.put_video(&put_video_request(&path, &event.uri)).await?;
        Ok(BlobEventOutcome::Submitted(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness, uploaded};

    #[test]
    fn test_request_from_nested_blob() {
        let path = BlobPath::parse("content/2024/keynote.final.mp4").unwrap();
        let request = put_video_request(&path, "https://blob.test/content/2024/keynote.final.mp4");

        assert_eq!(request.path, "content/2024/keynote.final.mp4");
        assert_eq!(request.name, "keynote.final");
        assert_eq!(request.uri, "https://blob.test/content/2024/keynote.final.mp4");
    }

    #[test]
    fn test_pipeline_outputs_detected() {
        for name in [
            "content/keynote_Insights.json",
            "content/keynote_Ocr.json",
            "content/dir/keynote_MultiLanguageDetection.json",
        ] {
            assert!(is_pipeline_output(&BlobPath::parse(name).unwrap()), "{}", name);
        }
        for name in ["content/keynote.mp4", "content/notes.json", "content/Insights.mov"] {
            assert!(!is_pipeline_output(&BlobPath::parse(name).unwrap()), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_blob_event_submits_video() {
        let mut h = harness();
        h.indexer
            .expect_upload_video()
            .withf(|r| r.name == "keynote")
            .times(1)
            .returning(|_| Ok(uploaded("vi-7")));

        let outcome = h
            .build()
            .handle_blob_event(&BlobEvent {
                name: "content/keynote.mov".into(),
                uri: "https://blob.test/content/keynote.mov".into(),
            })
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            BlobEventOutcome::Submitted(ref s) if s.video_indexer_id == "vi-7"
        ));
    }

    #[tokio::test]
    async fn test_blob_event_skips_own_output() {
        let mut h = harness();
        h.indexer.expect_upload_video().never();

        let outcome = h
            .build()
            .handle_blob_event(&BlobEvent {
                name: "content/keynote_Faces.json".into(),
                uri: "https://blob.test/content/keynote_Faces.json".into(),
            })
            .await
            .unwrap();

        assert!(matches!(outcome, BlobEventOutcome::Skipped { .. }));
    }
}
