//! Flattening a stored Video Indexer index end to end.

use serde_json::json;
use vidx_insights::{document_from_index, InsightsFlattener};

fn sample_index() -> serde_json::Value {
    json!({
        "accountId": "00000000-0000-0000-0000-000000000000",
        "id": "a1b2c3d4e5",
        "name": "keynote",
        "state": "Processed",
        "summarizedInsights": { "brands": [{ "name": "Summary only", "confidence": 1.0 }] },
        "videos": [{
            "id": "a1b2c3d4e5",
            "state": "Processed",
            "insights": {
                "version": "1.0.0.0",
                "duration": "0:02:11.3",
                "sourceLanguage": "en-US",
                "language": "en-US",
                "brands": [
                    { "id": 1, "referenceType": "Wiki", "name": "Contoso", "confidence": 0.92 },
                    { "id": 2, "referenceType": "Wiki", "name": "Fabrikam", "confidence": 0.0 }
                ],
                "topics": [
                    {
                        "id": 1,
                        "name": "Technology",
                        "referenceId": "Technology",
                        "confidence": 0.81
                    }
                ],
                "keywords": [
                    { "id": 1, "text": "cloud platform", "confidence": 0.64, "language": "en-US" }
                ],
                "labels": [
                    { "id": 1, "name": "person", "language": "en-US", "instances": [
                        { "confidence": 0.71, "start": "0:00:00", "end": "0:00:05" },
                        { "confidence": 0.98, "start": "0:00:07", "end": "0:00:31" }
                    ]}
                ],
                "ocr": [
                    { "id": 1, "text": "WELCOME", "confidence": 0.88, "left": 10, "top": 20 }
                ],
                "namedLocations": [
                    { "id": 1, "name": "Seattle", "referenceId": "Seattle", "confidence": 1.0 }
                ],
                "faces": [
                    { "id": 1, "name": "Unknown #1", "confidence": 0.0 }
                ]
            }
        }]
    })
}

#[test]
fn test_index_flattens_in_category_order() {
    let document = document_from_index("keynote_Insights.json", sample_index()).unwrap();
    let records = InsightsFlattener::new().flatten([("keynote_Insights.json", &document)], 0.0);

    let rows: Vec<_> = records
        .iter()
        .map(|r| (r.feature_type.as_str(), r.feature_value.as_str(), r.confidence_score))
        .collect();

    assert_eq!(
        rows,
        vec![
            ("brands", "Contoso", 0.92),
            ("topics", "Technology", 0.81),
            ("keywords", "cloud platform", 0.64),
            ("labels", "person", 0.98),
            ("ocr", "WELCOME", 0.88),
            ("namedLocations", "Seattle", 1.0),
        ]
    );
    assert!(records
        .iter()
        .all(|r| r.source_language == "en-US" && r.source_ref == "keynote_Insights.json"));
}

#[test]
fn test_index_zero_confidence_survives_negative_floor() {
    let document = document_from_index("keynote_Insights.json", sample_index()).unwrap();
    let records = InsightsFlattener::new().flatten([("keynote_Insights.json", &document)], -1.0);

    assert!(records
        .iter()
        .any(|r| r.feature_value == "Fabrikam" && r.confidence_score == 0.0));
    assert_eq!(records.len(), 7);
}
