//! Video Indexer REST client.
//!
//! Every account-scoped call carries an access token in the `accessToken`
//! query parameter. Tokens are cached; a 401 invalidates the cache and the
//! call is replayed once with a new token.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};
use vidx_models::ArtifactType;

use crate::config::IndexerConfig;
use crate::error::{IndexerError, IndexerResult};
use crate::indexer::{UploadRequest, UploadedVideo, VideoIndexer};
use crate::metrics::record_request;
use crate::retry::with_retry;
use crate::token_cache::TokenCache;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Video Indexer API client.
#[derive(Clone)]
pub struct VideoIndexerClient {
    http: Client,
    config: IndexerConfig,
    tokens: Arc<TokenCache>,
}

impl VideoIndexerClient {
    pub fn new(config: IndexerConfig) -> IndexerResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .user_agent(concat!("vidx-indexer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(IndexerError::from)?;

        Ok(Self {
            http,
            tokens: Arc::new(TokenCache::new(config.token_ttl)),
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> IndexerResult<Self> {
        Self::new(IndexerConfig::from_env()?)
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    fn account_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/Accounts/{}/{}",
            self.config.api_url, self.config.location, self.config.account_id, suffix
        )
    }

    /// Current account access token, fetching a new one when needed.
    pub async fn access_token(&self) -> IndexerResult<String> {
        self.tokens.get_or_refresh(|| self.fetch_access_token()).await
    }

    async fn fetch_access_token(&self) -> IndexerResult<String> {
        let url = format!(
            "{}/Auth/{}/Accounts/{}/AccessToken",
            self.config.api_url, self.config.location, self.config.account_id
        );
        let url = &url;

        with_retry(&self.config.retry, "access_token", move || async move {
            let response = self
                .http
                .get(url)
                .query(&[("allowEdit", "true")])
                .header(SUBSCRIPTION_KEY_HEADER, &self.config.subscription_key)
                .send()
                .await?;
            let response = check_status(response, "access_token").await?;
            read_json::<String>(response, "access_token").await
        })
        .await
    }

    /// Send a token-authorized request built by `build`, with retries and
    /// one replay on an expired token.
    async fn send_authorized<B>(&self, operation: &str, build: B) -> IndexerResult<Response>
    where
        B: Fn(&str) -> RequestBuilder + Sync,
    {
        let build = &build;
        let span = info_span!("indexer_request", operation = %operation);
        let start = Instant::now();

        let result = with_retry(&self.config.retry, operation, move || async move {
            let token = self.access_token().await?;
            let response = build(&token).send().await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                debug!(operation = %operation, "Access token rejected, refreshing");
                self.tokens.invalidate().await;
                let token = self.access_token().await?;
                let response = build(&token).send().await?;
                return check_status(response, operation).await;
            }

            check_status(response, operation).await
        })
        .instrument(span)
        .await;

        let status = match &result {
            Ok(response) => response.status().as_u16(),
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, start.elapsed().as_millis() as f64);

        result
    }
}

#[async_trait]
impl VideoIndexer for VideoIndexerClient {
    async fn upload_video(&self, request: &UploadRequest) -> IndexerResult<UploadedVideo> {
        info!(name = %request.name, "Uploading video to indexer");
        let url = self.account_url("Videos");

        let response = self
            .send_authorized("upload_video", |token| {
                let mut params = vec![
                    ("name", request.name.as_str()),
                    ("privacy", "Private"),
                    ("priority", "High"),
                    ("videoUrl", request.video_url.as_str()),
                    ("accessToken", token),
                ];
                if let Some(callback) = self.config.callback_url.as_deref() {
                    params.push(("callbackUrl", callback));
                }
                self.http.post(&url).query(&params)
            })
            .await?;

        let video: UploadedVideo = read_json(response, "upload_video").await?;
        if video.id.is_empty() {
            return Err(IndexerError::invalid_response("upload response has an empty id"));
        }

        info!(name = %request.name, video_id = %video.id, "Video accepted by indexer");
        Ok(video)
    }

    async fn get_artifact(&self, video_id: &str, artifact: ArtifactType) -> IndexerResult<Value> {
        let url = self.account_url(&format!("Videos/{}/ArtifactUrl", video_id));

        let response = self
            .send_authorized("artifact_url", |token| {
                self.http
                    .get(&url)
                    .query(&[("type", artifact.as_str()), ("accessToken", token)])
            })
            .await?;
        let download_url: String = read_json(response, "artifact_url").await?;
        let download_url = &download_url;

        // The returned URL is pre-signed; it takes no access token.
        let value = with_retry(&self.config.retry, "artifact_download", move || async move {
            let response = self.http.get(download_url).send().await?;
            let response = check_status(response, "artifact_download").await?;
            read_json::<Value>(response, "artifact_download").await
        })
        .await?;

        debug!(video_id = %video_id, artifact = %artifact, "Downloaded artifact");
        Ok(value)
    }

    async fn get_index(&self, video_id: &str) -> IndexerResult<Value> {
        let url = self.account_url(&format!("Videos/{}/Index", video_id));

        let response = self
            .send_authorized("get_index", |token| {
                self.http
                    .get(&url)
                    .header(SUBSCRIPTION_KEY_HEADER, &self.config.subscription_key)
                    .query(&[("accessToken", token)])
            })
            .await?;

        read_json(response, "get_index").await
    }
}

/// Pass successful responses through; turn anything else into an error.
///
/// Messages never include the request URL; it carries the access token.
async fn check_status(response: Response, operation: &str) -> IndexerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_ms = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));
    let body = response.text().await.unwrap_or_default();

    match (status, retry_after_ms) {
        (StatusCode::TOO_MANY_REQUESTS, Some(ms)) => Err(IndexerError::RateLimited(ms)),
        _ => Err(IndexerError::from_http_status(
            status.as_u16(),
            format!("{} failed ({}): {}", operation, status.as_u16(), body),
        )),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, operation: &str) -> IndexerResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IndexerError::invalid_response(format!("{}: {}", operation, e)))
}
