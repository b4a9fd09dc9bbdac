//! Azure Table Storage REST client.
//!
//! - SharedKeyLite signing on every request
//! - Pooled HTTP client with connect/request timeouts
//! - Exponential backoff with jitter for throttling and 5xx
//! - Tracing spans and request metrics per operation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, info_span, Instrument};

use crate::auth::{format_ms_date, SharedKeySigner};
use crate::connection::ConnectionString;
use crate::error::{TableError, TableResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::store::RowStore;
use crate::types::{escape_literal, CreateTableRequest, EntityQuery, QueryResponse, TableEntity};

const API_VERSION: &str = "2019-02-02";
const ODATA_ACCEPT: &str = "application/json;odata=nometadata";
const DATA_SERVICE_VERSION: &str = "3.0;NetFx";
const NEXT_PARTITION_HEADER: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_HEADER: &str = "x-ms-continuation-NextRowKey";

// =============================================================================
// Configuration
// =============================================================================

/// Table client configuration.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub connection: ConnectionString,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl TableConfig {
    pub fn new(connection: ConnectionString) -> Self {
        Self {
            connection,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    ///
    /// `SA_CONNX_STRING` is required; `TABLE_TIMEOUT_SECS` and
    /// `TABLE_CONNECT_TIMEOUT_SECS` tune the HTTP client.
    pub fn from_env() -> TableResult<Self> {
        let raw = std::env::var("SA_CONNX_STRING")
            .map_err(|_| {
                TableError::config_error("SA_CONNX_STRING must be set to access table storage")
            })?;

        if raw.trim().is_empty() {
            return Err(TableError::config_error("SA_CONNX_STRING cannot be empty"));
        }

        let timeout_secs: u64 = std::env::var("TABLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let connect_timeout_secs: u64 = std::env::var("TABLE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            connection: ConnectionString::parse(&raw)?,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Table Storage REST client.
#[derive(Clone)]
pub struct AzureTableClient {
    http: Client,
    signer: SharedKeySigner,
    base_url: String,
    retry: RetryConfig,
}

impl AzureTableClient {
    pub fn new(config: TableConfig) -> TableResult<Self> {
        let signer = SharedKeySigner::new(
            config.connection.account_name.clone(),
            &config.connection.account_key,
        )?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vidx-table/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TableError::Network)?;

        Ok(Self {
            http,
            signer,
            base_url: config.connection.table_endpoint,
            retry: config.retry,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> TableResult<Self> {
        Self::new(TableConfig::from_env()?)
    }

    pub fn account(&self) -> &str {
        self.signer.account()
    }

    fn entity_url(&self, table: &str, partition_key: &str, row_key: &str) -> String {
        format!(
            "{}/{}(PartitionKey='{}',RowKey='{}')",
            self.base_url,
            table,
            urlencoding::encode(&escape_literal(partition_key)),
            urlencoding::encode(&escape_literal(row_key)),
        )
    }

    /// Build, sign and send a request.
    ///
    /// The signature covers the final URL path, so the request is built first.
    async fn send_signed(&self, builder: RequestBuilder) -> TableResult<Response> {
        let mut request = builder.build()?;

        let date = format_ms_date(Utc::now());
        let authorization = self.signer.authorization(&date, request.url().path())?;

        let headers = request.headers_mut();
        headers.insert("x-ms-date", header_value(&date)?);
        headers.insert("x-ms-version", HeaderValue::from_static(API_VERSION));
        headers.insert(ACCEPT, HeaderValue::from_static(ODATA_ACCEPT));
        headers.insert("dataserviceversion", HeaderValue::from_static(DATA_SERVICE_VERSION));
        headers.insert("maxdataserviceversion", HeaderValue::from_static(DATA_SERVICE_VERSION));
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        Ok(self.http.execute(request).await?)
    }

    /// Fetch one page of query results plus the continuation tokens.
    async fn query_page(
        &self,
        table: &str,
        query: &EntityQuery,
        continuation: Option<&(String, Option<String>)>,
    ) -> TableResult<(Vec<TableEntity>, Option<(String, Option<String>)>)> {
        let url = format!("{}/{}()", self.base_url, table);

        let mut params = query.to_params();
        if let Some((next_partition, next_row)) = continuation {
            params.push(("NextPartitionKey", next_partition.clone()));
            if let Some(row) = next_row {
                params.push(("NextRowKey", row.clone()));
            }
        }

        let response = self.send_signed(self.http.get(&url).query(&params)).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(handle_error_response(status, &url, response).await);
        }

        let next = continuation_from(response.headers());
        let page: QueryResponse = response
            .json()
            .await
            .map_err(|e| TableError::invalid_response(format!("query {}: {}", table, e)))?;

        Ok((page.value, next))
    }

    /// Run a request future inside a span and record its outcome.
    async fn execute_request<T, F>(&self, operation: &str, table: &str, fut: F) -> TableResult<T>
    where
        F: std::future::Future<Output = TableResult<T>>,
    {
        let span = info_span!("table_request", operation = %operation, table = %table);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, table, status, latency_ms);

        result
    }
}

#[async_trait]
impl RowStore for AzureTableClient {
    async fn ensure_table(&self, table: &str) -> TableResult<bool> {
        let url = format!("{}/Tables", self.base_url);
        let body = CreateTableRequest { table_name: table };

        let this = self;
        let (url, body) = (&url, &body);
        self.execute_request("ensure_table", table, async {
            with_retry(&self.retry, "ensure_table", move || async move {
                let response = this
                    .send_signed(
                        this.http
                            .post(url)
                            .header("Prefer", "return-no-content")
                            .json(body),
                    )
                    .await?;

                match response.status() {
                    StatusCode::CREATED | StatusCode::NO_CONTENT => {
                        info!(table = %body.table_name, "Created table");
                        Ok(true)
                    }
                    StatusCode::CONFLICT => {
                        debug!(table = %body.table_name, "Table already exists");
                        Ok(false)
                    }
                    status => Err(handle_error_response(status, url, response).await),
                }
            })
            .await
        })
        .await
    }

    async fn upsert(&self, table: &str, entity: TableEntity) -> TableResult<()> {
        let url = self.entity_url(table, &entity.partition_key, &entity.row_key);
        let body = serde_json::to_vec(&entity)?;
        let merge = Method::from_bytes(b"MERGE")
            .map_err(|e| TableError::request_failed(format!("MERGE method: {}", e)))?;

        let this = self;
        let (url, body, merge) = (&url, &body, &merge);
        self.execute_request("upsert", table, async {
            with_retry(&self.retry, "upsert", move || async move {
                // No If-Match header: the service treats MERGE as insert-or-merge.
                let response = this
                    .send_signed(
                        this.http
                            .request(merge.clone(), url)
                            .header(CONTENT_TYPE, "application/json")
                            .body(body.clone()),
                    )
                    .await?;

                match response.status() {
                    StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
                    status => Err(handle_error_response(status, url, response).await),
                }
            })
            .await
        })
        .await
    }

    async fn query(&self, table: &str, query: &EntityQuery) -> TableResult<Vec<TableEntity>> {
        let this = self;
        self.execute_request("query", table, async {
            let mut entities = Vec::new();
            let mut continuation: Option<(String, Option<String>)> = None;

            loop {
                let token = continuation.as_ref();
                let (page, next) = with_retry(&self.retry, "query", move || {
                    this.query_page(table, query, token)
                })
                .await?;

                entities.extend(page);
                match next {
                    Some(next) => continuation = Some(next),
                    None => break,
                }
            }

            debug!(table = %table, count = entities.len(), "Query complete");
            Ok(entities)
        })
        .await
    }

    async fn check_connectivity(&self) -> TableResult<()> {
        let url = format!("{}/Tables", self.base_url);
        self.execute_request("check_connectivity", "Tables", async {
            let response = self
                .send_signed(self.http.get(&url).query(&[("$top", "1")]))
                .await?;
            match response.status() {
                StatusCode::OK => Ok(()),
                status => Err(handle_error_response(status, &url, response).await),
            }
        })
        .await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn header_value(value: &str) -> TableResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| TableError::request_failed(format!("invalid header value: {}", e)))
}

fn continuation_from(headers: &HeaderMap) -> Option<(String, Option<String>)> {
    let partition = headers
        .get(NEXT_PARTITION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())?;
    let row = headers
        .get(NEXT_ROW_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    Some((partition.to_string(), row))
}

#[derive(Deserialize)]
struct ServiceError {
    #[serde(rename = "odata.error")]
    error: ServiceErrorBody,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    code: String,
}

async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> TableError {
    let retry_after_ms = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));

    let body = response.text().await.unwrap_or_default();
    let code = serde_json::from_str::<ServiceError>(&body)
        .map(|e| e.error.code)
        .unwrap_or_default();

    let path = url.split('?').next().unwrap_or(url);
    match (status, retry_after_ms) {
        (StatusCode::TOO_MANY_REQUESTS, Some(ms)) => TableError::RateLimited(ms),
        _ if code.is_empty() => {
            TableError::from_http_status(status.as_u16(), format!("{} failed: {}", path, body))
        }
        _ => TableError::from_http_status(status.as_u16(), format!("{} failed: {}", path, code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEY: &str = "c3VwZXItc2VjcmV0LXRlc3Qta2V5LTAxMjM0NTY3ODk=";

    #[test]
    #[serial]
    fn test_config_requires_connection_string() {
        std::env::remove_var("SA_CONNX_STRING");
        let result = TableConfig::from_env();
        assert!(matches!(result, Err(TableError::ConfigError(_))));
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        std::env::set_var(
            "SA_CONNX_STRING",
            format!("AccountName=media01;AccountKey={}", KEY),
        );
        std::env::remove_var("TABLE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("TABLE_TIMEOUT_SECS");

        let config = TableConfig::from_env().unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connection.table_endpoint, "https://media01.table.core.windows.net");

        std::env::remove_var("SA_CONNX_STRING");
    }

    #[test]
    fn test_entity_url_escapes_keys() {
        let connection = ConnectionString::parse(&format!(
            "AccountName=a;AccountKey={};TableEndpoint=http://localhost:10002/a",
            KEY
        ))
        .unwrap();
        let client = AzureTableClient::new(TableConfig::new(connection)).unwrap();

        assert_eq!(
            client.entity_url("tracker", "examplekey", "it's here"),
            "http://localhost:10002/a/tracker(PartitionKey='examplekey',RowKey='it%27%27s%20here')"
        );
    }
}
