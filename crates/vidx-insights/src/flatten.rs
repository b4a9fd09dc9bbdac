//! The insights flattener.

use std::borrow::Borrow;

use serde_json::Value;
use vidx_models::{InsightsDocument, NormalizedRecord};

use crate::category::{CategoryRule, DEFAULT_CATEGORIES};
use crate::document::document_from_value;
use crate::error::InsightsResult;
use crate::extract::extract_pairs;

/// Flattens insights documents into one record per extracted feature value.
#[derive(Debug, Clone)]
pub struct InsightsFlattener {
    categories: Vec<CategoryRule>,
}

impl Default for InsightsFlattener {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.to_vec(),
        }
    }
}

impl InsightsFlattener {
    /// Flattener over the recognized categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattener over a custom category table. Output follows table order.
    pub fn with_categories(categories: Vec<CategoryRule>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    /// All records of one document, unfiltered.
    ///
    /// Categories that are absent or malformed contribute nothing.
    pub fn flatten_document(
        &self,
        source_ref: &str,
        document: &InsightsDocument,
    ) -> Vec<NormalizedRecord> {
        let mut records = Vec::new();

        for rule in &self.categories {
            let Some(payload) = document.category(&rule.name) else {
                continue;
            };
            let Some(pairs) = extract_pairs(rule.shape, payload) else {
                continue;
            };

            records.extend(pairs.into_iter().map(|(feature_value, confidence_score)| {
                NormalizedRecord {
                    source_ref: source_ref.to_string(),
                    source_language: document.source_language.clone(),
                    feature_type: rule.name.to_string(),
                    feature_value,
                    confidence_score,
                }
            }));
        }

        records
    }

    /// Flatten documents in order, then drop records at or below `confidence_floor`.
    pub fn flatten<I, S, D>(&self, documents: I, confidence_floor: f64) -> Vec<NormalizedRecord>
    where
        I: IntoIterator<Item = (S, D)>,
        S: AsRef<str>,
        D: Borrow<InsightsDocument>,
    {
        let records = documents
            .into_iter()
            .flat_map(|(source_ref, document)| {
                self.flatten_document(source_ref.as_ref(), document.borrow())
            })
            .collect();

        apply_confidence_floor(records, confidence_floor)
    }

    /// Like [`flatten`](Self::flatten), but over raw JSON documents.
    ///
    /// Fails on the first document missing `sourceLanguage` or `insights`.
    pub fn flatten_values<I, S>(
        &self,
        documents: I,
        confidence_floor: f64,
    ) -> InsightsResult<Vec<NormalizedRecord>>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let parsed = documents
            .into_iter()
            .map(|(source_ref, value)| -> InsightsResult<(S, InsightsDocument)> {
                let document = document_from_value(source_ref.as_ref(), value)?;
                Ok((source_ref, document))
            })
            .collect::<InsightsResult<Vec<_>>>()?;

        Ok(self.flatten(parsed, confidence_floor))
    }
}

/// Flatten with the recognized categories.
pub fn flatten<I, S, D>(documents: I, confidence_floor: f64) -> Vec<NormalizedRecord>
where
    I: IntoIterator<Item = (S, D)>,
    S: AsRef<str>,
    D: Borrow<InsightsDocument>,
{
    InsightsFlattener::new().flatten(documents, confidence_floor)
}

/// Keep records scoring strictly above `confidence_floor`.
///
/// A score equal to the floor is dropped.
pub fn apply_confidence_floor(
    records: Vec<NormalizedRecord>,
    confidence_floor: f64,
) -> Vec<NormalizedRecord> {
    records
        .into_iter()
        .filter(|record| record.confidence_score > confidence_floor)
        .collect()
}
