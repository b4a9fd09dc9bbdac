//! SharedKeyLite request signing for the Table service.
//!
//! The string to sign is `x-ms-date` followed by the canonicalized resource
//! (`/{account}{url path}`), separated by a newline. The signature is the
//! base64 HMAC-SHA256 of that string under the decoded account key.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{TableError, TableResult};

type HmacSha256 = Hmac<Sha256>;

/// Signs table requests with an account's shared key.
#[derive(Clone)]
pub struct SharedKeySigner {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeySigner")
            .field("account", &self.account)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SharedKeySigner {
    /// Create a signer from an account name and its base64 account key.
    pub fn new(account: impl Into<String>, account_key: &str) -> TableResult<Self> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| {
                TableError::config_error(format!("Account key is not valid base64: {}", e))
            })?;

        Ok(Self {
            account: account.into(),
            key,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// `Authorization` header value for a request to `path` sent at `date`.
    ///
    /// `date` must be the exact `x-ms-date` header value.
    pub fn authorization(&self, date: &str, path: &str) -> TableResult<String> {
        let string_to_sign = format!("{}\n/{}{}", date, self.account, path);

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TableError::auth_error(format!("Invalid signing key: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!("SharedKeyLite {}:{}", self.account, signature))
    }
}

/// RFC 1123 date as the service expects in `x-ms-date`.
pub fn format_ms_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
