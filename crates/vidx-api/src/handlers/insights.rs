//! Insights triggers: the indexer callback and the flattening run.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use vidx_models::VideoState;
use vidx_pipeline::{DownloadInsightsSummary, ProcessInsightsSummary};

use crate::error::ApiResult;
use crate::state::AppState;

/// Query parameters of `/api/download-insights`, as sent by the indexer
/// callback.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DownloadInsightsQuery {
    #[serde(default)]
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,

    /// Processing state reported by the indexer
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadInsightsResponse {
    Completed(DownloadInsightsSummary),
    /// The callback reported a state other than `Processed`.
    Ignored { video_indexer_id: String, state: String },
}

/// Store a finished video's artifacts and insights.
///
/// Callbacks for intermediate or failed indexing states carry no insights
/// yet and are acknowledged without running the stage.
pub async fn download_insights(
    State(state): State<AppState>,
    Query(query): Query<DownloadInsightsQuery>,
) -> ApiResult<Json<DownloadInsightsResponse>> {
    query.validate()?;

    if let Some(reported) = query.state.as_deref() {
        if !reported.eq_ignore_ascii_case(VideoState::Processed.as_str()) {
            info!(video_indexer_id = %query.id, state = %reported, "Ignoring indexer callback");
            return Ok(Json(DownloadInsightsResponse::Ignored {
                video_indexer_id: query.id,
                state: reported.to_string(),
            }));
        }
    }

    let summary = state.pipeline.download_insights(&query.id).await?;
    Ok(Json(DownloadInsightsResponse::Completed(summary)))
}

/// Query parameters of `/api/process-insights`.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessInsightsQuery {
    /// Overrides the configured floor for this run
    pub confidence_floor: Option<f64>,
}

/// Flatten every stored insights document into the insights table.
pub async fn process_insights(
    State(state): State<AppState>,
    Query(query): Query<ProcessInsightsQuery>,
) -> ApiResult<Json<ProcessInsightsSummary>> {
    let summary = state.pipeline.process_insights(query.confidence_floor).await?;
    Ok(Json(summary))
}
