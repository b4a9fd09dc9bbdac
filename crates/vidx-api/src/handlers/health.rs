//! Liveness and readiness probes.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Liveness: the process is up and serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Outcome of one dependency round trip.
#[derive(Debug, Serialize)]
pub struct Probe {
    pub ok: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn probe<F, E>(check: F) -> Probe
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    let start = Instant::now();
    let result = check.await;
    Probe {
        ok: result.is_ok(),
        latency_ms: start.elapsed().as_millis() as u64,
        error: result.err().map(|e| e.to_string()),
    }
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub table: Probe,
    pub storage: Probe,
}

/// Readiness: the table service and the insights container answer.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let pipeline = &state.pipeline;
    let container = pipeline.config().insights_container.as_str();

    let (table, storage) = tokio::join!(
        probe(pipeline.row_store().check_connectivity()),
        probe(pipeline.blob_store().check_connectivity(container)),
    );

    let ready = table.ok && storage.ok;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, table, storage }))
}
