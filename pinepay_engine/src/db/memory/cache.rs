use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::traits::{CacheError, KeyValueCache};

/// An in-process [`KeyValueCache`]. Expired entries are dropped lazily, the next time their key is read or written.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (String, DateTime<Utc>)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instant at which the entry for `key` expires, if there is a live one.
    pub async fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries.get(key).map(|(_, at)| *at).filter(|at| *at > Utc::now())
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {},
                None => return Ok(None),
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|(_, at)| *at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if ttl <= Duration::zero() {
            return Err(CacheError::InvalidTtl { key: key.to_string(), ttl });
        }
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| CacheError::InvalidTtl { key: key.to_string(), ttl })?;
        self.entries.write().await.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}
