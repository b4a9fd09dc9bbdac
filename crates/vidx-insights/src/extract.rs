//! Per-shape extraction of `(value, confidence)` pairs.

use serde_json::Value;

use crate::category::ExtractionShape;

/// Extract every `(value, confidence)` pair from a category payload.
///
/// Returns `None` when any part of the payload does not match `shape`; the
/// category then contributes nothing at all, never a partial list.
pub fn extract_pairs(shape: ExtractionShape, payload: &Value) -> Option<Vec<(String, f64)>> {
    match shape {
        ExtractionShape::Named | ExtractionShape::Textual => {
            extract_scored(payload, shape.value_key())
        }
        ExtractionShape::InstanceMax => extract_instance_max(payload, shape.value_key()),
    }
}

fn extract_scored(payload: &Value, value_key: &str) -> Option<Vec<(String, f64)>> {
    payload
        .as_array()?
        .iter()
        .map(|item| {
            let value = item.get(value_key)?.as_str()?;
            let confidence = item.get("confidence")?.as_f64()?;
            Some((value.to_string(), confidence))
        })
        .collect()
}

fn extract_instance_max(payload: &Value, value_key: &str) -> Option<Vec<(String, f64)>> {
    payload
        .as_array()?
        .iter()
        .map(|item| {
            let value = item.get(value_key)?.as_str()?;
            let confidence = item
                .get("instances")?
                .as_array()?
                .iter()
                .map(|instance| instance.get("confidence").and_then(Value::as_f64))
                .collect::<Option<Vec<f64>>>()?
                .into_iter()
                .reduce(f64::max)?;
            Some((value.to_string(), confidence))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_extraction() {
        let payload = json!([
            { "id": 1, "name": "Acme", "confidence": 0.75 },
            { "id": 2, "name": "Globex", "confidence": 1 }
        ]);
        let pairs = extract_pairs(ExtractionShape::Named, &payload).unwrap();
        assert_eq!(
            pairs,
            vec![("Acme".to_string(), 0.75), ("Globex".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_textual_extraction_uses_text_key() {
        let payload = json!([{ "text": "EXIT", "confidence": 0.62, "language": "en-US" }]);
        let pairs = extract_pairs(ExtractionShape::Textual, &payload).unwrap();
        assert_eq!(pairs, vec![("EXIT".to_string(), 0.62)]);

        // A `name` key is not enough for a textual category.
        let named = json!([{ "name": "EXIT", "confidence": 0.62 }]);
        assert!(extract_pairs(ExtractionShape::Textual, &named).is_none());
    }

    #[test]
    fn test_instance_max_takes_maximum() {
        let payload = json!([{
            "name": "cat",
            "instances": [{ "confidence": 0.3 }, { "confidence": 0.9 }, { "confidence": 0.5 }]
        }]);
        let pairs = extract_pairs(ExtractionShape::InstanceMax, &payload).unwrap();
        assert_eq!(pairs, vec![("cat".to_string(), 0.9)]);
    }

    #[test]
    fn test_instance_max_without_instances_is_malformed() {
        let payload = json!([
            { "name": "dog", "instances": [{ "confidence": 0.4 }] },
            { "name": "cat", "instances": [] }
        ]);
        assert!(extract_pairs(ExtractionShape::InstanceMax, &payload).is_none());
    }

    #[test]
    fn test_one_bad_item_rejects_whole_payload() {
        let payload = json!([
            { "text": "ok", "confidence": 0.5 },
            { "text": "missing confidence" }
        ]);
        assert!(extract_pairs(ExtractionShape::Textual, &payload).is_none());
    }

    #[test]
    fn test_non_array_payload_is_malformed() {
        assert!(extract_pairs(ExtractionShape::Named, &json!({ "name": "x" })).is_none());
        assert!(extract_pairs(ExtractionShape::Named, &json!(null)).is_none());
    }

    #[test]
    fn test_non_string_value_is_malformed() {
        let payload = json!([{ "name": 42, "confidence": 0.5 }]);
        assert!(extract_pairs(ExtractionShape::Named, &payload).is_none());
    }

    #[test]
    fn test_empty_payload_yields_no_pairs() {
        let pairs = extract_pairs(ExtractionShape::Named, &json!([])).unwrap();
        assert!(pairs.is_empty());
    }
}
