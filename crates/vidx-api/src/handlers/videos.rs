//! Video submission triggers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use vidx_pipeline::{BlobEvent, BlobEventOutcome, PutVideoRequest, PutVideoSummary};

use crate::error::ApiResult;
use crate::state::AppState;

/// Query parameters of `/api/put-video`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PutVideoQuery {
    #[serde(default)]
    #[validate(length(min = 1, message = "path is required"))]
    pub path: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(url(message = "uri must be an absolute URL"))]
    pub uri: String,
}

impl From<PutVideoQuery> for PutVideoRequest {
    fn from(query: PutVideoQuery) -> Self {
        PutVideoRequest {
            path: query.path,
            name: query.name,
            uri: query.uri,
        }
    }
}

/// Submit a stored video to the indexer and start tracking it.
pub async fn put_video(
    State(state): State<AppState>,
    Query(query): Query<PutVideoQuery>,
) -> ApiResult<Json<PutVideoSummary>> {
    query.validate()?;

    let summary = state.pipeline.put_video(&query.into()).await?;
    Ok(Json(summary))
}

/// Blob-created notification.
pub async fn blob_event(
    State(state): State<AppState>,
    Json(event): Json<BlobEvent>,
) -> ApiResult<Json<BlobEventOutcome>> {
    let outcome = state.pipeline.handle_blob_event(&event).await?;
    Ok(Json(outcome))
}
