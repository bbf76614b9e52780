use std::{fmt::Debug, sync::Arc};

use chrono::{Duration, Utc};
use log::*;
use pine_labs_tools::{PineLabsApiError, MAX_TOKEN_LIFETIME};
use pinepay_common::Secret;

use crate::{
    ppe_api::errors::TokenCacheError,
    traits::{KeyValueCache, PaymentProvider},
};

pub const ACCESS_TOKEN_CACHE_KEY: &str = "pinelabs:access_token";
/// Cached tokens expire this long before the provider says they do.
pub const TOKEN_SAFETY_MARGIN: Duration = Duration::minutes(5);

/// Cache-aside access to the provider's bearer token.
///
/// A cache hit is returned without touching the network. On a miss, a new token is requested from the provider and
/// written back with a TTL that is [`TOKEN_SAFETY_MARGIN`] shorter than the token's real lifetime, so the cached
/// entry always disappears before the token stops working.
///
/// Concurrent misses each fetch their own token. Token issuance is idempotent, so no attempt is made to coalesce them.
pub struct TokenCache<C, P> {
    cache: C,
    provider: Arc<P>,
}

impl<C, P> Debug for TokenCache<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenCache({ACCESS_TOKEN_CACHE_KEY})")
    }
}

impl<C, P> TokenCache<C, P>
where
    C: KeyValueCache,
    P: PaymentProvider,
{
    pub fn new(cache: C, provider: Arc<P>) -> Self {
        Self { cache, provider }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn get_token(&self) -> Result<Secret<String>, TokenCacheError> {
        match self.cache.get(ACCESS_TOKEN_CACHE_KEY).await {
            Ok(Some(token)) if !token.is_empty() => {
                trace!("🔑️ Access token cache hit");
                return Ok(Secret::new(token));
            },
            Ok(_) => debug!("🔑️ No cached access token. Requesting a new one."),
            Err(e) => warn!("🔑️ Could not read the token cache. Requesting a new token instead. {e}"),
        }
        let token = self.provider.fetch_access_token().await.map_err(|e| match e {
            PineLabsApiError::TokenFetchError(s) => TokenCacheError::TokenFetchError(s),
            e => TokenCacheError::TokenFetchError(e.to_string()),
        })?;
        if token.access_token.reveal().is_empty() {
            return Err(TokenCacheError::EmptyToken);
        }
        let lifetime = token.declared_lifetime(Utc::now()).unwrap_or_else(|| self.provider.default_token_lifetime());
        self.store(&token.access_token, lifetime).await;
        Ok(token.access_token)
    }

    // Best-effort. The caller gets its token whether or not the write succeeds.
    async fn store(&self, token: &Secret<String>, lifetime: Duration) {
        let Some(ttl) = cache_ttl(lifetime) else {
            warn!("🔑️ The access token is only valid for {lifetime}. It will not be cached.");
            return;
        };
        match self.cache.set(ACCESS_TOKEN_CACHE_KEY, token.reveal(), ttl).await {
            Ok(()) => debug!("🔑️ Access token cached for {} seconds", ttl.num_seconds()),
            Err(e) => warn!("🔑️ Could not cache the access token. {e}"),
        }
    }
}

/// The TTL for a token that is valid for `lifetime`, or `None` if the token would expire within the safety margin.
/// Lifetimes longer than [`MAX_TOKEN_LIFETIME`] are treated as that long.
pub fn cache_ttl(lifetime: Duration) -> Option<Duration> {
    let ttl = lifetime.min(MAX_TOKEN_LIFETIME).checked_sub(&TOKEN_SAFETY_MARGIN)?;
    (ttl > Duration::zero()).then_some(ttl)
}

#[cfg(test)]
mod test {
    use async_trait::async_trait;
    use pine_labs_tools::AccessToken;

    use super::*;
    use crate::{db::memory::MemoryCache, test_utils::mocks::MockProvider, traits::CacheError};

    fn token(value: &str, expires_in: Option<i64>) -> AccessToken {
        AccessToken { access_token: Secret::new(value.to_string()), expires_at: None, expires_in }
    }

    struct BrokenCache;

    #[async_trait]
    impl KeyValueCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn ttl_is_shorter_than_lifetime() {
        assert_eq!(cache_ttl(Duration::minutes(60)), Some(Duration::minutes(55)));
        assert_eq!(cache_ttl(Duration::minutes(5)), None);
        assert_eq!(cache_ttl(Duration::seconds(30)), None);
        assert_eq!(cache_ttl(Duration::days(10_000)), Some(MAX_TOKEN_LIFETIME - TOKEN_SAFETY_MARGIN));
        assert_eq!(cache_ttl(Duration::days(-1)), None);
    }

    #[tokio::test]
    async fn cache_hit_makes_no_request() {
        let _ = env_logger::try_init();
        let cache = MemoryCache::new();
        cache.set(ACCESS_TOKEN_CACHE_KEY, "cached_token", Duration::minutes(10)).await.unwrap();
        let mut provider = MockProvider::new();
        provider.expect_fetch_access_token().never();
        let tokens = TokenCache::new(cache, Arc::new(provider));
        let token = tokens.get_token().await.unwrap();
        assert_eq!(token.reveal(), "cached_token");
    }

    #[tokio::test]
    async fn cache_miss_fetches_once_and_populates_cache() {
        let _ = env_logger::try_init();
        let mut provider = MockProvider::new();
        provider.expect_fetch_access_token().times(1).returning(|| Ok(token("fresh_token", Some(3600))));
        provider.expect_default_token_lifetime().return_const(Duration::minutes(60));
        let tokens = TokenCache::new(MemoryCache::new(), Arc::new(provider));
        let before = Utc::now();
        let token = tokens.get_token().await.unwrap();
        assert_eq!(token.reveal(), "fresh_token");
        let expires_at = tokens.cache().expires_at(ACCESS_TOKEN_CACHE_KEY).await.expect("Token was not cached");
        assert!(expires_at < before + Duration::seconds(3600));
        assert!(expires_at <= Utc::now() + Duration::minutes(55));
        // Served from the cache from now on. The mock panics if it is called a second time.
        let token = tokens.get_token().await.unwrap();
        assert_eq!(token.reveal(), "fresh_token");
    }

    #[tokio::test]
    async fn default_lifetime_is_used_when_none_is_declared() {
        let _ = env_logger::try_init();
        let mut provider = MockProvider::new();
        provider.expect_fetch_access_token().times(1).returning(|| Ok(token("fresh_token", None)));
        provider.expect_default_token_lifetime().return_const(Duration::minutes(30));
        let tokens = TokenCache::new(MemoryCache::new(), Arc::new(provider));
        tokens.get_token().await.unwrap();
        let expires_at = tokens.cache().expires_at(ACCESS_TOKEN_CACHE_KEY).await.unwrap();
        assert!(expires_at <= Utc::now() + Duration::minutes(25));
        assert!(expires_at > Utc::now() + Duration::minutes(24));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_empty() {
        let _ = env_logger::try_init();
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_access_token()
            .times(1)
            .returning(|| Err(PineLabsApiError::TokenFetchError("Token endpoint returned status 401".into())));
        let tokens = TokenCache::new(MemoryCache::new(), Arc::new(provider));
        let err = tokens.get_token().await.unwrap_err();
        assert!(matches!(err, TokenCacheError::TokenFetchError(_)));
        assert!(tokens.cache().get(ACCESS_TOKEN_CACHE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_failures_do_not_fail_the_caller() {
        let _ = env_logger::try_init();
        let mut provider = MockProvider::new();
        provider.expect_fetch_access_token().times(2).returning(|| Ok(token("fresh_token", Some(3600))));
        provider.expect_default_token_lifetime().return_const(Duration::minutes(60));
        let tokens = TokenCache::new(BrokenCache, Arc::new(provider));
        assert_eq!(tokens.get_token().await.unwrap().reveal(), "fresh_token");
        assert_eq!(tokens.get_token().await.unwrap().reveal(), "fresh_token");
    }

    #[tokio::test]
    async fn huge_declared_lifetimes_are_capped() {
        let _ = env_logger::try_init();
        for expires_in in [10_000_000_000_000, i64::MAX] {
            let mut provider = MockProvider::new();
            provider.expect_fetch_access_token().times(1).returning(move || Ok(token("durable", Some(expires_in))));
            provider.expect_default_token_lifetime().return_const(Duration::minutes(60));
            let tokens = TokenCache::new(MemoryCache::new(), Arc::new(provider));
            assert_eq!(tokens.get_token().await.unwrap().reveal(), "durable");
            let expires_at = tokens.cache().expires_at(ACCESS_TOKEN_CACHE_KEY).await.expect("Token was not cached");
            assert!(expires_at <= Utc::now() + MAX_TOKEN_LIFETIME - TOKEN_SAFETY_MARGIN);
        }
    }

    #[tokio::test]
    async fn empty_cached_value_is_a_miss() {
        let _ = env_logger::try_init();
        let cache = MemoryCache::new();
        cache.set(ACCESS_TOKEN_CACHE_KEY, "", Duration::minutes(10)).await.unwrap();
        let mut provider = MockProvider::new();
        provider.expect_fetch_access_token().times(1).returning(|| Ok(token("fresh_token", Some(3600))));
        provider.expect_default_token_lifetime().return_const(Duration::minutes(60));
        let tokens = TokenCache::new(cache, Arc::new(provider));
        assert_eq!(tokens.get_token().await.unwrap().reveal(), "fresh_token");
        let cached = tokens.cache().get(ACCESS_TOKEN_CACHE_KEY).await.unwrap();
        assert_eq!(cached.as_deref(), Some("fresh_token"));
    }

    #[tokio::test]
    async fn short_lived_tokens_are_not_cached() {
        let _ = env_logger::try_init();
        let mut provider = MockProvider::new();
        provider.expect_fetch_access_token().times(1).returning(|| Ok(token("brief", Some(120))));
        provider.expect_default_token_lifetime().return_const(Duration::minutes(60));
        let tokens = TokenCache::new(MemoryCache::new(), Arc::new(provider));
        assert_eq!(tokens.get_token().await.unwrap().reveal(), "brief");
        assert!(tokens.cache().get(ACCESS_TOKEN_CACHE_KEY).await.unwrap().is_none());
    }
}
