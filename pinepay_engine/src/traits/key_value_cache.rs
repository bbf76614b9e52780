use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("The cache is unavailable. {0}")]
    Unavailable(String),
    #[error("Invalid time-to-live for key {key}: {ttl}")]
    InvalidTtl { key: String, ttl: Duration },
}

/// A string key-value store whose entries expire.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is no entry or it has expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry. The entry expires after `ttl`, which must be
    /// positive.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
