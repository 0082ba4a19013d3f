//! Access-token cache and the provider that fills it
//!
//! `TokenCache` is owned by whoever builds the client (one per session) and
//! shared through `Arc`. Entries are keyed by the SHA-256 digest of the
//! original refresh token, so distinct tokens never share an entry and the raw
//! token is never used as a map key.
//!
//! `TokenProvider` holds the cache lock across check, exchange and store. Two
//! concurrent callers for the same token therefore trigger a single exchange.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_TOKEN_TTL, REFRESH_MARGIN};
use crate::error::Result;
use crate::token::refresh_access_token;

/// An exchanged access token.
///
/// `expires_at` is a unix timestamp in milliseconds (absolute), computed from
/// the endpoint's `expires_in` delta at storage time.
#[derive(Clone)]
pub struct CachedToken {
    pub access_token: String,
    /// Latest refresh token for this entry (rotated or the original)
    pub refresh_token: String,
    pub expires_at: u64,
}

impl CachedToken {
    /// Usable only while it outlives `REFRESH_MARGIN`.
    pub fn is_fresh(&self, now_millis: u64) -> bool {
        self.expires_at > now_millis.saturating_add(millis(REFRESH_MARGIN))
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// In-memory token cache. Grows with the number of distinct tokens seen.
#[derive(Default)]
pub struct TokenCache {
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a refresh token: lowercase hex SHA-256.
    pub fn key_for(refresh_token: &str) -> String {
        Sha256::digest(refresh_token.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    pub async fn get(&self, refresh_token: &str) -> Option<CachedToken> {
        let entries = self.entries.lock().await;
        entries.get(&Self::key_for(refresh_token)).cloned()
    }

    pub async fn insert(&self, refresh_token: &str, token: CachedToken) {
        let mut entries = self.entries.lock().await;
        entries.insert(Self::key_for(refresh_token), token);
    }

    /// Drop the entry for a token. Returns the evicted entry if there was one.
    pub async fn evict(&self, refresh_token: &str) -> Option<CachedToken> {
        let mut entries = self.entries.lock().await;
        entries.remove(&Self::key_for(refresh_token))
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Current time as unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(millis)
        .unwrap_or_default()
}

/// Hands out access tokens for refresh tokens, exchanging only when needed.
pub struct TokenProvider {
    client: reqwest::Client,
    token_endpoint: String,
    cache: Arc<TokenCache>,
    default_ttl: Duration,
}

impl TokenProvider {
    pub fn new(
        client: reqwest::Client,
        token_endpoint: impl Into<String>,
        cache: Arc<TokenCache>,
    ) -> Self {
        Self {
            client,
            token_endpoint: token_endpoint.into(),
            cache,
            default_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Lifetime used when the endpoint omits `expires_in`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Return a usable access token for `refresh_token`.
    ///
    /// Serves from the cache while the entry is fresh. Otherwise exchanges the
    /// most recent refresh token known for this entry, stores the result and
    /// returns it. A failed exchange evicts the entry.
    pub async fn access_token(&self, refresh_token: &str) -> Result<String> {
        let key = TokenCache::key_for(refresh_token);
        let mut entries = self.cache.entries.lock().await;
        let now = now_millis();

        let refresh = match entries.get(&key) {
            Some(cached) if cached.is_fresh(now) => {
                debug!("using cached access token");
                return Ok(cached.access_token.clone());
            }
            Some(cached) => {
                debug!(
                    expires_at = cached.expires_at,
                    "cached access token near expiry, exchanging"
                );
                cached.refresh_token.clone()
            }
            None => refresh_token.to_string(),
        };

        match refresh_access_token(&self.client, &self.token_endpoint, &refresh).await {
            Ok(response) => {
                let ttl = response
                    .expires_in
                    .map(Duration::from_secs)
                    .unwrap_or(self.default_ttl);
                let rotated = response.refresh_token.is_some();
                let cached = CachedToken {
                    access_token: response.access_token,
                    refresh_token: response.refresh_token.unwrap_or(refresh),
                    expires_at: now.saturating_add(millis(ttl)),
                };
                let access = cached.access_token.clone();
                entries.insert(key, cached);
                metrics::counter!("hubstaff_token_exchanges_total", "outcome" => "success")
                    .increment(1);
                info!(ttl_secs = ttl.as_secs(), rotated, "access token exchanged");
                Ok(access)
            }
            Err(e) => {
                entries.remove(&key);
                metrics::counter!("hubstaff_token_exchanges_total", "outcome" => "failure")
                    .increment(1);
                warn!(error = %e, "token exchange failed, cache entry evicted");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MINUTE_MS: u64 = 60_000;

    fn provider_for(server: &MockServer, cache: Arc<TokenCache>) -> TokenProvider {
        TokenProvider::new(
            reqwest::Client::new(),
            format!("{}/access_tokens", server.uri()),
            cache,
        )
    }

    fn cached(access: &str, refresh: &str, expires_at: u64) -> CachedToken {
        CachedToken {
            access_token: access.into(),
            refresh_token: refresh.into(),
            expires_at,
        }
    }

    async fn mount_exchange(server: &MockServer, body: serde_json::Value, times: u64) {
        Mock::given(method("POST"))
            .and(path("/access_tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(server)
            .await;
    }

    #[test]
    fn key_is_full_digest_not_prefix() {
        let a = TokenCache::key_for("pat_shared_prefix_0123456789_A");
        let b = TokenCache::key_for("pat_shared_prefix_0123456789_B");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(!a.contains("pat_"), "key must not embed the token");
    }

    #[test]
    fn freshness_respects_five_minute_margin() {
        let now = 1_700_000_000_000;
        assert!(cached("a", "r", now + 10 * MINUTE_MS).is_fresh(now));
        assert!(!cached("a", "r", now + 4 * MINUTE_MS).is_fresh(now));
        assert!(!cached("a", "r", now + 5 * MINUTE_MS).is_fresh(now));
    }

    #[tokio::test]
    async fn first_call_exchanges_and_caches() {
        let server = MockServer::start().await;
        mount_exchange(
            &server,
            serde_json::json!({"access_token": "at_1", "expires_in": 3600}),
            1,
        )
        .await;
        let cache = Arc::new(TokenCache::new());
        let tokens = provider_for(&server, cache.clone());

        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_1");
        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_1");

        let entry = cache.get("pat").await.unwrap();
        assert_eq!(entry.refresh_token, "pat");
        let remaining = entry.expires_at.saturating_sub(now_millis());
        assert!(remaining > 59 * MINUTE_MS && remaining <= 60 * MINUTE_MS);
    }

    #[tokio::test]
    async fn entry_ten_minutes_out_is_reused() {
        let server = MockServer::start().await;
        mount_exchange(&server, serde_json::json!({"access_token": "unused"}), 0).await;
        let cache = Arc::new(TokenCache::new());
        cache
            .insert("pat", cached("at_cached", "pat", now_millis() + 10 * MINUTE_MS))
            .await;
        let tokens = provider_for(&server, cache);

        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_cached");
        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_cached");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entry_four_minutes_out_triggers_one_exchange() {
        let server = MockServer::start().await;
        mount_exchange(
            &server,
            serde_json::json!({"access_token": "at_new", "expires_in": 7200}),
            1,
        )
        .await;
        let cache = Arc::new(TokenCache::new());
        cache
            .insert("pat", cached("at_old", "pat", now_millis() + 4 * MINUTE_MS))
            .await;
        let tokens = provider_for(&server, cache);

        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_new");
        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_new");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_used_next_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("refresh_token=rt_rotated"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "at_2"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let cache = Arc::new(TokenCache::new());
        // Expired entry whose refresh token was rotated by an earlier exchange
        cache
            .insert("pat_original", cached("at_1", "rt_rotated", now_millis()))
            .await;
        let tokens = provider_for(&server, cache.clone());

        assert_eq!(tokens.access_token("pat_original").await.unwrap(), "at_2");
        assert_eq!(
            cache.get("pat_original").await.unwrap().refresh_token,
            "rt_rotated"
        );
    }

    #[tokio::test]
    async fn missing_expires_in_uses_default_ttl() {
        let server = MockServer::start().await;
        mount_exchange(&server, serde_json::json!({"access_token": "at"}), 1).await;
        let cache = Arc::new(TokenCache::new());
        let tokens =
            provider_for(&server, cache.clone()).with_default_ttl(Duration::from_secs(86_400));

        tokens.access_token("pat").await.unwrap();
        let remaining = cache
            .get("pat")
            .await
            .unwrap()
            .expires_at
            .saturating_sub(now_millis());
        assert!(remaining > 23 * 60 * MINUTE_MS, "remaining: {remaining}");
    }

    #[tokio::test]
    async fn huge_expires_in_saturates_and_stays_cached() {
        let server = MockServer::start().await;
        mount_exchange(
            &server,
            serde_json::json!({"access_token": "at_long", "expires_in": 18_446_744_073_709_551_u64}),
            1,
        )
        .await;
        let cache = Arc::new(TokenCache::new());
        let tokens = provider_for(&server, cache.clone());

        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_long");
        assert_eq!(cache.get("pat").await.unwrap().expires_at, u64::MAX);
        // Served from cache; the exchange mock expects exactly one call.
        assert_eq!(tokens.access_token("pat").await.unwrap(), "at_long");
    }

    #[test]
    fn freshness_saturates_near_max() {
        assert!(!cached("a", "r", u64::MAX).is_fresh(u64::MAX - 1));
        assert!(cached("a", "r", u64::MAX).is_fresh(0));
    }

    #[tokio::test]
    async fn failed_exchange_evicts_entry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let cache = Arc::new(TokenCache::new());
        cache.insert("pat", cached("at_old", "pat", now_millis())).await;
        let tokens = provider_for(&server, cache.clone());

        let err = tokens.access_token("pat").await.unwrap_err();
        assert!(matches!(err, Error::TokenExchange(_)), "got: {err:?}");
        assert!(cache.get("pat").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_exchange() {
        let server = MockServer::start().await;
        mount_exchange(
            &server,
            serde_json::json!({"access_token": "at_once", "expires_in": 3600}),
            1,
        )
        .await;
        let tokens = Arc::new(provider_for(&server, Arc::new(TokenCache::new())));

        let mut handles = vec![];
        for _ in 0..5 {
            let tokens = tokens.clone();
            handles.push(tokio::spawn(
                async move { tokens.access_token("pat").await.unwrap() },
            ));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), "at_once");
        }
    }

    #[tokio::test]
    async fn evict_removes_only_that_token() {
        let cache = TokenCache::new();
        let far = now_millis() + 60 * MINUTE_MS;
        cache.insert("pat_a", cached("at_a", "pat_a", far)).await;
        cache.insert("pat_b", cached("at_b", "pat_b", far)).await;

        assert!(cache.evict("pat_a").await.is_some());
        assert!(cache.evict("pat_a").await.is_none());
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("pat_b").await.unwrap().access_token, "at_b");
    }

    #[test]
    fn debug_redacts_tokens() {
        let debug = format!("{:?}", cached("at_secret", "rt_secret", 42));
        assert!(!debug.contains("at_secret"));
        assert!(!debug.contains("rt_secret"));
        assert!(debug.contains("42"));
    }
}
