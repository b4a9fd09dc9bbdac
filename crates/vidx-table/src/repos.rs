//! Typed repositories for the tracking and insights tables.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, warn};

use vidx_models::{NormalizedRecord, TrackedVideo, VideoState};

use crate::error::{TableError, TableResult};
use crate::store::RowStore;
use crate::types::{EntityQuery, TableEntity};

mod columns {
    pub const VIDEO_INDEXER_ID: &str = "VideoIndexerId";
    pub const VIDEO_NAME: &str = "VideoName";
    pub const VIDEO_PATH: &str = "VideoPath";
    pub const VIDEO_URL: &str = "VideoUrl";
    pub const INSIGHTS_PATH: &str = "InsightsPath";
    pub const STATE: &str = "State";
    pub const TIMESTAMP: &str = "Timestamp";

    pub const FILE_NAME: &str = "FileName";
    pub const SOURCE_LANGUAGE: &str = "SourceLanguage";
    pub const FEATURE_TYPE: &str = "FeatureType";
    pub const FEATURE: &str = "Feature";
    pub const CONFIDENCE_SCORE: &str = "ConfidenceScore";
}

/// Replace characters the Table service rejects in key columns.
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | '#' | '?' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Row key for a flattened insight: `{source}_{type}_{value}`.
pub fn insight_row_key(record: &NormalizedRecord) -> String {
    sanitize_key(&format!(
        "{}_{}_{}",
        record.source_ref, record.feature_type, record.feature_value
    ))
}

// =============================================================================
// Tracker
// =============================================================================

/// Repository for the video tracking table.
#[derive(Clone)]
pub struct TrackerRepository {
    store: Arc<dyn RowStore>,
    table: String,
    partition_key: String,
}

impl TrackerRepository {
    pub fn new(
        store: Arc<dyn RowStore>,
        table: impl Into<String>,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            partition_key: partition_key.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn ensure_table(&self) -> TableResult<bool> {
        self.store.ensure_table(&self.table).await
    }

    /// Insert or merge the tracking row for `video`.
    pub async fn upsert(&self, video: &TrackedVideo) -> TableResult<()> {
        let entity = tracked_video_to_entity(&self.partition_key, video);
        self.store.upsert(&self.table, entity).await?;
        info!(
            video_indexer_id = %video.video_indexer_id,
            state = %video.state,
            "Tracked video updated"
        );
        Ok(())
    }

    /// Look up a tracked video by the id the indexer assigned it.
    pub async fn find_by_indexer_id(
        &self,
        video_indexer_id: &str,
    ) -> TableResult<Option<TrackedVideo>> {
        let query = EntityQuery::filter_eq(columns::VIDEO_INDEXER_ID, video_indexer_id)
            .and_eq("PartitionKey", &self.partition_key)
            .top(1);

        let entities = self.store.query(&self.table, &query).await?;
        entities.first().map(entity_to_tracked_video).transpose()
    }
}

fn tracked_video_to_entity(partition_key: &str, video: &TrackedVideo) -> TableEntity {
    TableEntity::new(partition_key, sanitize_key(&video.video_indexer_id))
        .with(columns::VIDEO_INDEXER_ID, video.video_indexer_id.as_str())
        .with(columns::VIDEO_NAME, video.video_name.as_str())
        .with(columns::VIDEO_PATH, video.video_path.as_str())
        .with(columns::VIDEO_URL, video.video_url.as_str())
        .with_opt(columns::INSIGHTS_PATH, video.insights_path.as_deref())
        .with(columns::STATE, video.state.as_str())
}

fn entity_to_tracked_video(entity: &TableEntity) -> TableResult<TrackedVideo> {
    let required = |name: &str| {
        entity
            .get_str(name)
            .map(str::to_string)
            .ok_or_else(|| {
                TableError::invalid_response(format!(
                    "tracker row {} has no {}",
                    entity.row_key, name
                ))
            })
    };

    // Rows written before a state column existed are treated as uploaded.
    let state = match entity.get_str(columns::STATE) {
        Some(raw) => raw.parse::<VideoState>().map_err(TableError::invalid_response)?,
        None => VideoState::Uploaded,
    };

    Ok(TrackedVideo {
        video_indexer_id: required(columns::VIDEO_INDEXER_ID)?,
        video_name: required(columns::VIDEO_NAME)?,
        video_path: required(columns::VIDEO_PATH)?,
        video_url: required(columns::VIDEO_URL)?,
        insights_path: entity.get_str(columns::INSIGHTS_PATH).map(str::to_string),
        state,
        updated_at: entity
            .get_str(columns::TIMESTAMP)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc)),
    })
}

// =============================================================================
// Insights
// =============================================================================

/// Outcome of writing a batch of insight records.
#[derive(Debug, Default)]
pub struct UpsertSummary {
    pub written: usize,
    /// Row key and error message for every record that failed.
    pub failures: Vec<(String, String)>,
}

impl UpsertSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Repository for the flattened insights table.
#[derive(Clone)]
pub struct InsightsRepository {
    store: Arc<dyn RowStore>,
    table: String,
    partition_key: String,
}

impl InsightsRepository {
    pub fn new(
        store: Arc<dyn RowStore>,
        table: impl Into<String>,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            partition_key: partition_key.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn ensure_table(&self) -> TableResult<bool> {
        self.store.ensure_table(&self.table).await
    }

    pub async fn upsert_record(&self, record: &NormalizedRecord) -> TableResult<()> {
        let entity = record_to_entity(&self.partition_key, record);
        self.store.upsert(&self.table, entity).await
    }

    /// Write every record. A failed row is logged and counted; the rest
    /// are still written.
    pub async fn upsert_records(&self, records: &[NormalizedRecord]) -> UpsertSummary {
        let mut summary = UpsertSummary::default();

        for record in records {
            match self.upsert_record(record).await {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    let row_key = insight_row_key(record);
                    warn!(row_key = %row_key, "Failed to write insight row: {}", e);
                    counter!("insight_row_failures_total", "table" => self.table.clone())
                        .increment(1);
                    summary.failures.push((row_key, e.to_string()));
                }
            }
        }

        info!(
            table = %self.table,
            written = summary.written,
            failed = summary.failures.len(),
            "Insight rows written"
        );
        summary
    }

    /// Every insight row for one source document.
    pub async fn find_by_source(&self, source_ref: &str) -> TableResult<Vec<NormalizedRecord>> {
        let query = EntityQuery::filter_eq(columns::FILE_NAME, source_ref);
        let entities = self.store.query(&self.table, &query).await?;
        entities.iter().map(entity_to_record).collect()
    }
}

fn record_to_entity(partition_key: &str, record: &NormalizedRecord) -> TableEntity {
    TableEntity::new(partition_key, insight_row_key(record))
        .with(columns::FILE_NAME, record.source_ref.as_str())
        .with(columns::SOURCE_LANGUAGE, record.source_language.as_str())
        .with(columns::FEATURE_TYPE, record.feature_type.as_str())
        .with(columns::FEATURE, record.feature_value.as_str())
        .with_double(columns::CONFIDENCE_SCORE, record.confidence_score)
}

fn entity_to_record(entity: &TableEntity) -> TableResult<NormalizedRecord> {
    let text = |name: &str| {
        entity
            .get_str(name)
            .map(str::to_string)
            .ok_or_else(|| {
                TableError::invalid_response(format!(
                    "insight row {} has no {}",
                    entity.row_key, name
                ))
            })
    };

    Ok(NormalizedRecord {
        source_ref: text(columns::FILE_NAME)?,
        source_language: text(columns::SOURCE_LANGUAGE)?,
        feature_type: text(columns::FEATURE_TYPE)?,
        feature_value: text(columns::FEATURE)?,
        confidence_score: entity.get_f64(columns::CONFIDENCE_SCORE).ok_or_else(|| {
            TableError::invalid_response(format!(
                "insight row {} has no {}",
                entity.row_key,
                columns::CONFIDENCE_SCORE
            ))
        })?,
    })
}
