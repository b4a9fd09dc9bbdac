//! Storage account connection strings.
//!
//! Accepts the `Key=Value;Key=Value` form issued by the portal, plus the
//! `UseDevelopmentStorage=true` shortcut for a local emulator.

use crate::error::{TableError, TableResult};

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Parsed storage account connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_name: String,
    pub account_key: String,
    /// Base URL for the Table service, without a trailing slash.
    pub table_endpoint: String,
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("table_endpoint", &self.table_endpoint)
            .finish()
    }
}

impl ConnectionString {
    /// The local emulator account.
    pub fn development() -> Self {
        Self {
            account_name: DEV_ACCOUNT_NAME.to_string(),
            account_key: DEV_ACCOUNT_KEY.to_string(),
            table_endpoint: DEV_TABLE_ENDPOINT.to_string(),
        }
    }

    pub fn parse(raw: &str) -> TableResult<Self> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut suffix = None;
        let mut table_endpoint = None;
        let mut development = false;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            // Keys may carry '=' padding, so split on the first one only.
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                TableError::config_error(format!(
                    "Malformed connection string segment: {}",
                    segment_name(segment)
                ))
            })?;

            match key.trim() {
                "DefaultEndpointsProtocol" => protocol = Some(value.trim().to_string()),
                "AccountName" => account_name = Some(value.trim().to_string()),
                "AccountKey" => account_key = Some(value.trim().to_string()),
                "EndpointSuffix" => suffix = Some(value.trim().to_string()),
                "TableEndpoint" => {
                    table_endpoint = Some(value.trim().trim_end_matches('/').to_string())
                }
                "UseDevelopmentStorage" => development = value.trim().eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if development {
            let mut dev = Self::development();
            if let Some(endpoint) = table_endpoint {
                dev.table_endpoint = endpoint;
            }
            return Ok(dev);
        }

        let account_name = account_name
            .ok_or_else(|| TableError::config_error("Connection string has no AccountName"))?;
        let account_key = account_key
            .ok_or_else(|| TableError::config_error("Connection string has no AccountKey"))?;

        let table_endpoint = table_endpoint.unwrap_or_else(|| {
            format!(
                "{}://{}.table.{}",
                protocol.as_deref().unwrap_or("https"),
                account_name,
                suffix.as_deref().unwrap_or("core.windows.net")
            )
        });

        Ok(Self {
            account_name,
            account_key,
            table_endpoint,
        })
    }
}

impl std::str::FromStr for ConnectionString {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Never echo a full segment back; it may be the key.
fn segment_name(segment: &str) -> &str {
    segment.get(..segment.len().min(24)).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_connection_string() {
        let cs = ConnectionString::parse(
            concat!(
                "DefaultEndpointsProtocol=https;AccountName=media01;",
                "AccountKey=a2V5PT0=;EndpointSuffix=core.windows.net"
            ),
        )
        .unwrap();

        assert_eq!(cs.account_name, "media01");
        assert_eq!(cs.account_key, "a2V5PT0=");
        assert_eq!(cs.table_endpoint, "https://media01.table.core.windows.net");
    }

    #[test]
    fn test_parse_keeps_key_padding() {
        let cs = ConnectionString::parse("AccountName=a;AccountKey=abc==").unwrap();
        assert_eq!(cs.account_key, "abc==");
        assert_eq!(cs.table_endpoint, "https://a.table.core.windows.net");
    }

    #[test]
    fn test_explicit_table_endpoint() {
        let cs = ConnectionString::parse(
            "AccountName=a;AccountKey=aw==;TableEndpoint=http://localhost:9000/a/",
        )
        .unwrap();
        assert_eq!(cs.table_endpoint, "http://localhost:9000/a");
    }

    #[test]
    fn test_development_storage() {
        let cs: ConnectionString = "UseDevelopmentStorage=true".parse().unwrap();
        assert_eq!(cs, ConnectionString::development());
        assert_eq!(cs.table_endpoint, "http://127.0.0.1:10002/devstoreaccount1");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = ConnectionString::parse("AccountName=a").unwrap_err();
        assert!(matches!(err, TableError::ConfigError(_)));
    }

    #[test]
    fn test_malformed_segment() {
        let err = ConnectionString::parse("AccountName=a;garbage").unwrap_err();
        assert!(matches!(err, TableError::ConfigError(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let cs = ConnectionString::parse("AccountName=a;AccountKey=c2VjcmV0").unwrap();
        assert!(!format!("{:?}", cs).contains("c2VjcmV0"));
    }
}
