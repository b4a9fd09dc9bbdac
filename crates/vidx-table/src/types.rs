//! Table entity and query types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ODATA_TYPE_SUFFIX: &str = "@odata.type";

/// A single table row: the two key columns plus arbitrary properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,

    #[serde(rename = "RowKey")]
    pub row_key: String,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: Map::new(),
        }
    }

    /// Set a string or other natively typed property.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Set a double property.
    ///
    /// JSON cannot tell `1.0` from `1`, so the column type is annotated
    /// explicitly; otherwise whole-number scores would land as Int32.
    pub fn with_double(mut self, name: &str, value: f64) -> Self {
        self.properties.insert(name.to_string(), Value::from(value));
        self.properties
            .insert(format!("{}{}", name, ODATA_TYPE_SUFFIX), Value::from("Edm.Double"));
        self
    }

    /// Set a property only when a value is present.
    pub fn with_opt(self, name: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    /// Numeric property; doubles returned as strings (e.g. "NaN") are parsed.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.properties.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// OData query options for listing entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityQuery {
    pub filter: Option<String>,
    pub select: Vec<String>,
    pub top: Option<u32>,
}

impl EntityQuery {
    /// Match rows whose `property` equals the string `value`.
    pub fn filter_eq(property: &str, value: &str) -> Self {
        Self {
            filter: Some(format!("{} eq '{}'", property, escape_literal(value))),
            ..Self::default()
        }
    }

    /// Add another equality clause joined with `and`.
    pub fn and_eq(mut self, property: &str, value: &str) -> Self {
        let clause = format!("{} eq '{}'", property, escape_literal(value));
        self.filter = Some(match self.filter.take() {
            Some(existing) => format!("{} and {}", existing, clause),
            None => clause,
        });
        self
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn top(mut self, n: u32) -> Self {
        self.top = Some(n);
        self
    }

    /// Query string pairs, without continuation tokens.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            params.push(("$filter", filter.clone()));
        }
        if !self.select.is_empty() {
            params.push(("$select", self.select.join(",")));
        }
        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }
        params
    }
}

/// OData string literal: single quotes are doubled.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Body of a query response.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub value: Vec<TableEntity>,
}

/// Body of a create-table request.
#[derive(Debug, Serialize)]
pub(crate) struct CreateTableRequest<'a> {
    #[serde(rename = "TableName")]
    pub table_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_serializes_flat() {
        let entity = TableEntity::new("examplekey", "clip")
            .with("FileName", "clip.json")
            .with_double("ConfidenceScore", 1.0);

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["PartitionKey"], "examplekey");
        assert_eq!(value["RowKey"], "clip");
        assert_eq!(value["FileName"], "clip.json");
        assert_eq!(value["ConfidenceScore"], 1.0);
        assert_eq!(value["ConfidenceScore@odata.type"], "Edm.Double");
    }

    #[test]
    fn test_entity_deserializes_extra_columns() {
        let entity: TableEntity = serde_json::from_value(json!({
            "PartitionKey": "examplekey",
            "RowKey": "abc",
            "Timestamp": "2024-10-15T12:00:00Z",
            "State": "Uploaded",
            "ConfidenceScore": 1
        }))
        .unwrap();

        assert_eq!(entity.row_key, "abc");
        assert_eq!(entity.get_str("State"), Some("Uploaded"));
        assert_eq!(entity.get_f64("ConfidenceScore"), Some(1.0));
        assert_eq!(entity.get_str("Missing"), None);
    }

    #[test]
    fn test_with_opt_skips_none() {
        let entity = TableEntity::new("p", "r").with_opt("InsightsPath", None::<String>);
        assert!(entity.properties.is_empty());
    }

    #[test]
    fn test_filter_escapes_quotes() {
        let query = EntityQuery::filter_eq("VideoName", "o'brien.mp4").and_eq("State", "Uploaded");
        assert_eq!(
            query.filter.as_deref(),
            Some("VideoName eq 'o''brien.mp4' and State eq 'Uploaded'")
        );
    }

    #[test]
    fn test_to_params() {
        let query = EntityQuery::filter_eq("VideoIndexerId", "abc")
            .select(&["VideoName", "State"])
            .top(1);

        assert_eq!(
            query.to_params(),
            vec![
                ("$filter", "VideoIndexerId eq 'abc'".to_string()),
                ("$select", "VideoName,State".to_string()),
                ("$top", "1".to_string()),
            ]
        );
        assert!(EntityQuery::default().to_params().is_empty());
    }
}
