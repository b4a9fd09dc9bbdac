//! Validation of raw insights documents.

use serde_json::{Map, Value};
use vidx_models::InsightsDocument;

use crate::error::{InsightsError, InsightsResult};

const SOURCE_LANGUAGE: &str = "sourceLanguage";
const INSIGHTS: &str = "insights";
const VIDEOS: &str = "videos";

/// Build a document from a bare `{sourceLanguage, insights}` object.
///
/// Missing or mistyped top-level fields are rejected rather than defaulted:
/// the language is copied into every record of the document.
pub fn document_from_value(source_ref: &str, value: Value) -> InsightsResult<InsightsDocument> {
    let Value::Object(mut object) = value else {
        return Err(InsightsError::NotAnObject {
            source_ref: source_ref.to_string(),
        });
    };

    let source_language = take_language(source_ref, &mut object)?;
    let insights = take_insights(source_ref, &mut object)?;

    Ok(InsightsDocument::new(source_language, insights))
}

/// Build a document from a stored indexer payload.
///
/// Accepts either a bare document (see [`document_from_value`]) or a full
/// video index, in which case the first video's `insights` object is used and
/// its own `sourceLanguage` is the document language.
pub fn document_from_index(source_ref: &str, value: Value) -> InsightsResult<InsightsDocument> {
    let Value::Object(mut object) = value else {
        return Err(InsightsError::NotAnObject {
            source_ref: source_ref.to_string(),
        });
    };

    if object.contains_key(INSIGHTS) || !object.contains_key(VIDEOS) {
        return document_from_value(source_ref, Value::Object(object));
    }

    let videos = match object.remove(VIDEOS) {
        Some(Value::Array(videos)) => videos,
        _ => {
            return Err(InsightsError::invalid_field(source_ref, VIDEOS, "an array"));
        }
    };

    let Some(Value::Object(mut video)) = videos.into_iter().next() else {
        return Err(InsightsError::EmptyIndex {
            source_ref: source_ref.to_string(),
        });
    };

    let mut insights = take_insights(source_ref, &mut video)?;

    // The index nests the language inside `insights`; fall back to the video.
    let source_language = match insights.remove(SOURCE_LANGUAGE) {
        Some(Value::String(language)) => language,
        Some(_) => {
            return Err(InsightsError::invalid_field(
                source_ref,
                SOURCE_LANGUAGE,
                "a string",
            ))
        }
        None => take_language(source_ref, &mut video)?,
    };

    Ok(InsightsDocument::new(source_language, insights))
}

fn take_language(source_ref: &str, object: &mut Map<String, Value>) -> InsightsResult<String> {
    match object.remove(SOURCE_LANGUAGE) {
        Some(Value::String(language)) => Ok(language),
        Some(_) => Err(InsightsError::invalid_field(
            source_ref,
            SOURCE_LANGUAGE,
            "a string",
        )),
        None => Err(InsightsError::missing_field(source_ref, SOURCE_LANGUAGE)),
    }
}

fn take_insights(
    source_ref: &str,
    object: &mut Map<String, Value>,
) -> InsightsResult<Map<String, Value>> {
    match object.remove(INSIGHTS) {
        Some(Value::Object(insights)) => Ok(insights),
        Some(_) => Err(InsightsError::invalid_field(source_ref, INSIGHTS, "an object")),
        None => Err(InsightsError::missing_field(source_ref, INSIGHTS)),
    }
}
