//! Pipeline metrics.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::logging::Stage;

pub mod names {
    /// Stage runs by stage and outcome.
    pub const STAGE_RUNS_TOTAL: &str = "pipeline_stage_runs_total";

    /// Stage duration in seconds by stage.
    pub const STAGE_DURATION_SECONDS: &str = "pipeline_stage_duration_seconds";

    /// Artifacts stored or skipped by outcome.
    pub const ARTIFACTS_TOTAL: &str = "pipeline_artifacts_total";

    /// Insight records by outcome (extracted, kept, written, failed).
    pub const INSIGHT_RECORDS_TOTAL: &str = "pipeline_insight_records_total";
}

pub fn record_stage(stage: Stage, success: bool, elapsed: Duration) {
    counter!(
        names::STAGE_RUNS_TOTAL,
        "stage" => stage.as_str(),
        "status" => if success { "success" } else { "error" }
    )
    .increment(1);

    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage.as_str())
        .record(elapsed.as_secs_f64());
}

pub fn record_artifact(stored: bool) {
    counter!(
        names::ARTIFACTS_TOTAL,
        "outcome" => if stored { "stored" } else { "skipped" }
    )
    .increment(1);
}

pub fn record_insight_records(outcome: &'static str, count: usize) {
    counter!(names::INSIGHT_RECORDS_TOTAL, "outcome" => outcome).increment(count as u64);
}
