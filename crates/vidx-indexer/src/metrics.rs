//! Indexer request metrics.

use metrics::{counter, histogram};

pub mod names {
    pub const REQUESTS_TOTAL: &str = "indexer_requests_total";
    pub const RETRIES_TOTAL: &str = "indexer_retries_total";
    pub const LATENCY_SECONDS: &str = "indexer_latency_seconds";
    pub const TOKEN_REFRESHES_TOTAL: &str = "indexer_token_refreshes_total";
}

pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "operation" => operation.to_string())
        .record(latency_ms / 1000.0);
}

pub fn record_retry(operation: &str) {
    counter!(names::RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}

pub fn record_token_refresh() {
    counter!(names::TOKEN_REFRESHES_TOTAL).increment(1);
}
