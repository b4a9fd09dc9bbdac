//! Insights document and flattened record models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single analysis document as produced by the video indexer.
///
/// `insights` maps a feature category name (`brands`, `labels`, ...) to a
/// category-specific payload. The payloads are kept as raw JSON because their
/// shape is only checked when a category is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsDocument {
    /// Detected language code for the whole document (e.g. `en-US`)
    pub source_language: String,

    /// Feature category name to payload
    pub insights: Map<String, Value>,
}

impl InsightsDocument {
    /// Create a document from a language code and an insights mapping.
    pub fn new(source_language: impl Into<String>, insights: Map<String, Value>) -> Self {
        Self {
            source_language: source_language.into(),
            insights,
        }
    }

    /// Raw payload for a category, if present.
    pub fn category(&self, name: &str) -> Option<&Value> {
        self.insights.get(name)
    }
}

/// One flattened insight: a single feature value of a single category in a
/// single source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedRecord {
    /// Caller-supplied document identifier (file name or URI)
    pub source_ref: String,

    /// Language code copied from the document
    pub source_language: String,

    /// Category name the value was extracted from
    pub feature_type: String,

    /// Extracted name or text
    pub feature_value: String,

    /// Confidence reported by the indexer, nominally in [0.0, 1.0]
    pub confidence_score: f64,
}

impl NormalizedRecord {
    /// Key identifying this record downstream: `(source_ref, feature_type, feature_value)`.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.source_ref, &self.feature_type, &self.feature_value)
    }
}
