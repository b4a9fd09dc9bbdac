//! ProcessInsights: flatten every stored insights document into table rows.

use serde::Serialize;
use serde_json::Value;
use vidx_insights::{apply_confidence_floor, document_from_index};
use vidx_models::InsightsDocument;
use vidx_storage::get_json;

use crate::error::{PipelineError, PipelineResult};
use crate::logging::{Stage, StageLogger};
use crate::metrics::record_insight_records;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInsightsSummary {
    pub confidence_floor: f64,
    /// Insights documents found in the container
    pub documents_found: usize,
    /// Documents that were read and flattened
    pub documents_processed: usize,
    /// Documents that could not be read or parsed, with the reason
    pub documents_skipped: Vec<(String, String)>,
    /// Records produced before the confidence floor was applied
    pub records_extracted: usize,
    /// Records above the confidence floor
    pub records_kept: usize,
    pub rows_written: usize,
    /// Row key and reason for every record that could not be written
    pub row_failures: Vec<(String, String)>,
}

impl Pipeline {
    /// Read every insights document in the configured container, flatten
    /// them in listing order and upsert the records scoring strictly above
    /// the floor.
    ///
    /// `confidence_floor` overrides the configured floor for this run.
    pub async fn process_insights(
        &self,
        confidence_floor: Option<f64>,
    ) -> PipelineResult<ProcessInsightsSummary> {
        let container = self.config.insights_container.clone();
        let logger = StageLogger::new(Stage::ProcessInsights, &container);

        self.run_stage(&logger, async {
            let floor = confidence_floor.unwrap_or(self.config.confidence_floor);
            if !floor.is_finite() {
                return Err(PipelineError::invalid_input(
                    "confidence_floor must be a finite number",
                ));
            }
            logger.log_start(&format!("confidence floor {}", floor));

            let listing = self.blobs.list_blobs(&container, "").await?;
            let candidates: Vec<_> = listing
                .into_iter()
                .filter(|info| info.path.name.contains(self.config.insights_marker.as_str()))
                .collect();
            let documents_found = candidates.len();

            let mut documents: Vec<(String, InsightsDocument)> =
                Vec::with_capacity(documents_found);
            let mut documents_skipped = Vec::new();

            for info in candidates {
                let source_ref = info.path.file_name().to_string();

                let parsed = match get_json::<Value>(self.blobs.as_ref(), &info.path).await {
                    Ok(value) => {
                        document_from_index(&source_ref, value).map_err(PipelineError::from)
                    }
                    Err(e) => Err(e.into()),
                };

                match parsed {
                    Ok(document) => documents.push((source_ref, document)),
                    Err(e) => {
                        logger.log_warning(&format!("skipping {}: {}", info.path, e));
                        documents_skipped.push((info.path.to_string(), e.to_string()));
                    }
                }
            }

            let extracted: Vec<_> = documents
                .iter()
                .flat_map(|(source_ref, document)| {
                    self.flattener.flatten_document(source_ref, document)
                })
                .collect();
            let records_extracted = extracted.len();
            let records = apply_confidence_floor(extracted, floor);

            record_insight_records("extracted", records_extracted);
            record_insight_records("kept", records.len());
            logger.log_progress(&format!(
                "{} of {} records above floor from {} documents",
                records.len(),
                records_extracted,
                documents.len()
            ));

            let mut summary = ProcessInsightsSummary {
                confidence_floor: floor,
                documents_found,
                documents_processed: documents.len(),
                documents_skipped,
                records_extracted,
                records_kept: records.len(),
                rows_written: 0,
                row_failures: Vec::new(),
            };

            if !records.is_empty() {
                self.ensure_insights_table().await?;
                let written = self.insights.upsert_records(&records).await;
                record_insight_records("written", written.written);
                record_insight_records("failed", written.failures.len());
                summary.rows_written = written.written;
                summary.row_failures = written.failures;
            }

            logger.log_completion(&format!(
                "{} rows written, {} failed",
                summary.rows_written,
                summary.row_failures.len()
            ));
            Ok(summary)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::harness;
    use serde_json::json;

    fn index(language: &str, brands: Value) -> Value {
        json!({
            "id": "vi-1",
            "videos": [{ "insights": { "sourceLanguage": language, "brands": brands } }]
        })
    }

    #[tokio::test]
    async fn test_process_flattens_and_writes_rows() {
        let mut h = harness();
        h.blobs.put_json(
            "content/keynote_Insights.json",
            index("en-US", json!([
                { "name": "Contoso", "confidence": 0.9 },
                { "name": "Fabrikam", "confidence": 0.0 }
            ])),
        );
        h.blobs.put_json(
            "content/2024/demo_Insights.json",
            json!({
                "sourceLanguage": "fr-FR",
                "insights": { "topics": [{ "name": "Cuisine", "confidence": 0.6 }] }
            }),
        );
        h.blobs.put_json("content/keynote_Ocr.json", json!({ "results": [] }));

        let summary = h.build().process_insights(None).await.unwrap();

        assert_eq!(summary.documents_found, 2);
        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.records_extracted, 3);
        assert_eq!(summary.records_kept, 2);
        assert_eq!(summary.rows_written, 2);

        let row = h.rows.row("insights", "keynote_Insights.json_brands_Contoso").unwrap();
        assert_eq!(row.get_str("FileName"), Some("keynote_Insights.json"));
        assert_eq!(row.get_str("SourceLanguage"), Some("en-US"));
        assert_eq!(row.get_str("FeatureType"), Some("brands"));
        assert_eq!(row.get_f64("ConfidenceScore"), Some(0.9));

        assert!(h.rows.row("insights", "demo_Insights.json_topics_Cuisine").is_some());
        assert!(h.rows.row("insights", "keynote_Insights.json_brands_Fabrikam").is_none());
    }

    #[tokio::test]
    async fn test_floor_override_is_strict() {
        let mut h = harness();
        h.blobs.put_json(
            "content/keynote_Insights.json",
            index("en-US", json!([
                { "name": "Contoso", "confidence": 0.5 },
                { "name": "Fabrikam", "confidence": 0.51 }
            ])),
        );

        let summary = h.build().process_insights(Some(0.5)).await.unwrap();

        assert_eq!(summary.confidence_floor, 0.5);
        assert_eq!(summary.records_kept, 1);
        assert!(h.rows.row("insights", "keynote_Insights.json_brands_Fabrikam").is_some());
        assert!(h.rows.row("insights", "keynote_Insights.json_brands_Contoso").is_none());
    }

    #[tokio::test]
    async fn test_floor_of_one_writes_nothing() {
        let mut h = harness();
        h.blobs.put_json(
            "content/keynote_Insights.json",
            index("en-US", json!([{ "name": "Contoso", "confidence": 1.0 }])),
        );

        let summary = h.build().process_insights(Some(1.0)).await.unwrap();

        assert_eq!(summary.records_extracted, 1);
        assert_eq!(summary.records_kept, 0);
        assert_eq!(summary.rows_written, 0);
        assert!(h.rows.tables_created().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_document_is_skipped() {
        let mut h = harness();
        h.blobs.put_bytes("content/broken_Insights.json", b"{not json".to_vec());
        h.blobs.put_json("content/nolang_Insights.json", json!({ "insights": {} }));
        h.blobs.put_json(
            "content/keynote_Insights.json",
            index("en-US", json!([{ "name": "Contoso", "confidence": 0.9 }])),
        );

        let summary = h.build().process_insights(None).await.unwrap();

        assert_eq!(summary.documents_found, 3);
        assert_eq!(summary.documents_processed, 1);
        assert_eq!(summary.documents_skipped.len(), 2);
        assert_eq!(summary.rows_written, 1);
    }

    #[tokio::test]
    async fn test_row_failures_are_reported() {
        let mut h = harness();
        h.rows.fail_upserts_containing("Fabrikam");
        h.blobs.put_json(
            "content/keynote_Insights.json",
            index("en-US", json!([
                { "name": "Contoso", "confidence": 0.9 },
                { "name": "Fabrikam", "confidence": 0.8 }
            ])),
        );

        let summary = h.build().process_insights(None).await.unwrap();

        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.row_failures.len(), 1);
        assert_eq!(summary.row_failures[0].0, "keynote_Insights.json_brands_Fabrikam");
    }

    #[tokio::test]
    async fn test_nan_floor_rejected() {
        let mut h = harness();
        let err = h.build().process_insights(Some(f64::NAN)).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_container() {
        let mut h = harness();
        let summary = h.build().process_insights(None).await.unwrap();
        assert_eq!(summary.documents_found, 0);
        assert_eq!(summary.rows_written, 0);
    }
}
