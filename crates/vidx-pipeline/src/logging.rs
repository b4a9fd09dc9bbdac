//! Structured stage logging.

use std::fmt;

use tracing::{error, info, warn, Span};

/// The pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BlobEvent,
    PutVideo,
    DownloadInsights,
    ProcessInsights,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BlobEvent => "blob_event",
            Stage::PutVideo => "put_video",
            Stage::DownloadInsights => "download_insights",
            Stage::ProcessInsights => "process_insights",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger that tags every event with the stage and the thing it is working
/// on (a blob, a video id, or a container).
#[derive(Debug, Clone)]
pub struct StageLogger {
    stage: Stage,
    subject: String,
}

impl StageLogger {
    pub fn new(stage: Stage, subject: impl Into<String>) -> Self {
        Self {
            stage,
            subject: subject.into(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(stage = %self.stage, subject = %self.subject, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(stage = %self.stage, subject = %self.subject, "Stage progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(stage = %self.stage, subject = %self.subject, "Stage warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(stage = %self.stage, subject = %self.subject, "Stage error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(stage = %self.stage, subject = %self.subject, "Stage completed: {}", message);
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Span carrying the stage fields, for instrumenting a whole stage run.
    pub fn span(&self) -> Span {
        tracing::info_span!("stage", stage = %self.stage, subject = %self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_logger_fields() {
        let logger = StageLogger::new(Stage::DownloadInsights, "vi-42");
        assert_eq!(logger.stage(), Stage::DownloadInsights);
        assert_eq!(logger.subject(), "vi-42");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::PutVideo.to_string(), "put_video");
        assert_eq!(Stage::ProcessInsights.as_str(), "process_insights");
    }
}
