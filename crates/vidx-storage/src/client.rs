//! S3-compatible blob store implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use vidx_models::BlobPath;

use crate::error::{StorageError, StorageResult};
use crate::store::{BlobStore, ObjectInfo};

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region ("auto" for most S3-compatible providers)
    pub region: String,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("BLOB_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("BLOB_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("BLOB_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("BLOB_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("BLOB_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("BLOB_SECRET_ACCESS_KEY not set"))?,
            region: std::env::var("BLOB_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Blob store backed by an S3-compatible service. Containers map to buckets.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vidx",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_blob(
        &self,
        path: &BlobPath,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let len = data.len();
        debug!("Uploading {} bytes to {}", len, path);

        self.client
            .put_object()
            .bucket(&path.container)
            .key(&path.name)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::PutFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        info!("Uploaded {} bytes to {}", len, path);
        Ok(())
    }

    async fn get_blob(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", path);

        let response = self
            .client
            .get_object()
            .bucket(&path.container)
            .key(&path.name)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service) if service.is_no_such_key() => {
                    StorageError::not_found(path.to_string())
                }
                _ => StorageError::GetFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                },
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::GetFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    async fn list_blobs(&self, container: &str, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects in {} with prefix: {:?}", container, prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(container);

            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed {
                    container: container.to_string(),
                    reason: e.to_string(),
                })?;

            if let Some(ref contents) = response.contents {
                for obj in contents {
                    let Some(key) = obj.key.clone() else {
                        continue;
                    };
                    objects.push(ObjectInfo {
                        path: BlobPath::new(container, key),
                        size: obj.size.unwrap_or(0) as u64,
                        last_modified: obj
                            .last_modified
                            .as_ref()
                            .and_then(|t| t.to_millis().ok())
                            .map(|ms| ms as u64),
                    });
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn check_connectivity(&self, container: &str) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(container)
            .send()
            .await
            .map_err(|e| StorageError::Unreachable(format!("container {}: {}", container, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_requires_endpoint() {
        std::env::remove_var("BLOB_ENDPOINT_URL");
        let result = S3Config::from_env();
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
