//! Pipeline configuration.

use vidx_models::ArtifactType;

use crate::error::{PipelineError, PipelineResult};

/// Settings shared by all stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Table holding one tracking row per uploaded video
    pub tracker_table: String,
    /// Table holding flattened insight rows
    pub insights_table: String,
    /// Partition key for every row the pipeline writes
    pub partition_key: String,
    /// Container scanned for insights documents
    pub insights_container: String,
    /// Substring identifying insights documents among the container's blobs
    pub insights_marker: String,
    /// Records scoring at or below this are not written
    pub confidence_floor: f64,
    /// Artifacts downloaded for each processed video
    pub artifacts: Vec<ArtifactType>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracker_table: "tracker".to_string(),
            insights_table: "insights".to_string(),
            partition_key: "examplekey".to_string(),
            insights_container: "content".to_string(),
            insights_marker: "Insights".to_string(),
            confidence_floor: 0.0,
            artifacts: ArtifactType::ALL.to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    ///
    /// `SA_TABLE_TRACKER` and `SA_TABLE_INSIGHTS` are required.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();

        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PipelineError::config_error(format!("{} not set", name)))
        };

        let confidence_floor = match std::env::var("INSIGHTS_CONFIDENCE_FLOOR") {
            Ok(raw) => parse_floor(&raw)
                .map_err(|e| {
                    PipelineError::config_error(format!("INSIGHTS_CONFIDENCE_FLOOR: {}", e))
                })?,
            Err(_) => defaults.confidence_floor,
        };

        Ok(Self {
            tracker_table: required("SA_TABLE_TRACKER")?,
            insights_table: required("SA_TABLE_INSIGHTS")?,
            partition_key: std::env::var("TABLE_PARTITION_KEY").unwrap_or(defaults.partition_key),
            insights_container: std::env::var("INSIGHTS_CONTAINER")
                .unwrap_or(defaults.insights_container),
            insights_marker: defaults.insights_marker,
            confidence_floor,
            artifacts: defaults.artifacts,
        })
    }
}

/// Parse a confidence floor. Any finite number is accepted; values outside
/// [0, 1] simply keep everything or nothing.
pub fn parse_floor(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", raw));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for name in [
            "SA_TABLE_TRACKER",
            "SA_TABLE_INSIGHTS",
            "TABLE_PARTITION_KEY",
            "INSIGHTS_CONTAINER",
            "INSIGHTS_CONFIDENCE_FLOOR",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_tables() {
        clear();
        std::env::set_var("SA_TABLE_TRACKER", "tracker");
        let err = PipelineConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("SA_TABLE_INSIGHTS"));
        clear();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear();
        std::env::set_var("SA_TABLE_TRACKER", "videotracker");
        std::env::set_var("SA_TABLE_INSIGHTS", "videoinsights");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.tracker_table, "videotracker");
        assert_eq!(config.insights_table, "videoinsights");
        assert_eq!(config.partition_key, "examplekey");
        assert_eq!(config.insights_container, "content");
        assert_eq!(config.confidence_floor, 0.0);
        assert_eq!(config.artifacts.len(), 8);
        clear();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_floor() {
        clear();
        std::env::set_var("SA_TABLE_TRACKER", "t");
        std::env::set_var("SA_TABLE_INSIGHTS", "i");
        std::env::set_var("INSIGHTS_CONFIDENCE_FLOOR", "high");
        assert!(matches!(
            PipelineConfig::from_env(),
            Err(PipelineError::ConfigError(_))
        ));

        std::env::set_var("INSIGHTS_CONFIDENCE_FLOOR", "0.5");
        assert_eq!(PipelineConfig::from_env().unwrap().confidence_floor, 0.5);
        clear();
    }

    #[test]
    fn test_parse_floor() {
        assert_eq!(parse_floor(" 0.25 "), Ok(0.25));
        assert_eq!(parse_floor("-1"), Ok(-1.0));
        assert!(parse_floor("NaN").is_err());
        assert!(parse_floor("inf").is_err());
    }
}
