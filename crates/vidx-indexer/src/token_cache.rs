//! Access token cache for indexer calls.
//!
//! Tokens are refreshed a minute before their assumed expiry. Refresh is
//! single-flight: concurrent callers wait on the write lock and reuse the
//! token the first caller fetched. If a refresh fails while the previous
//! token is still inside its lifetime, that token is returned instead.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::IndexerResult;
use crate::metrics::record_token_refresh;

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct TokenCache {
    ttl: Duration,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: RwLock::new(None),
        }
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Cached token, or a new one from `fetch`.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> IndexerResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = IndexerResult<String>>,
    {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
                return Ok(cached.value.clone());
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while this one waited.
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
            return Ok(cached.value.clone());
        }

        match fetch().await {
            Ok(token) => {
                *cache = Some(CachedToken {
                    value: token.clone(),
                    expires_at: Instant::now() + self.ttl,
                });
                record_token_refresh();
                debug!(ttl_secs = self.ttl.as_secs(), "Refreshed indexer access token");
                Ok(token)
            }
            Err(e) => match cache.as_ref().filter(|c| c.is_usable()) {
                Some(cached) => {
                    warn!("Access token refresh failed, reusing current token: {}", e);
                    Ok(cached.value.clone())
                }
                None => Err(e),
            },
        }
    }
}
