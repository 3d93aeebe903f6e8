use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::metrics::blog::record_cache_event;

/// Namespace for every key this service writes to Redis.
const REDIS_KEY_PREFIX: &str = "page_cache:";
const INDEX_KEY_PREFIX: &str = "index_page:";
/// Entry limit of the in-process cache before it starts evicting live entries.
const DEFAULT_MAX_ENTRIES: usize = 1_000;

/// Storage for rendered page bodies.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    async fn set(&self, key: &str, body: Bytes, ttl: Duration) -> Result<()>;

    /// Drop every entry owned by this cache.
    async fn clear(&self) -> Result<()>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Redis-backed page cache shared by every worker and replica.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: ConnectionManager,
}

impl RedisPageCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(manager))
    }

    fn redis_key(key: &str) -> String {
        format!("{}{}", REDIS_KEY_PREFIX, key)
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.redis.clone();
        let data = conn
            .get::<_, Option<Vec<u8>>>(Self::redis_key(key))
            .await?;
        Ok(data.map(Bytes::from))
    }

    async fn set(&self, key: &str, body: Bytes, ttl: Duration) -> Result<()> {
        let mut conn = self.redis.clone();
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(Self::redis_key(key), body.as_ref(), seconds)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        let pattern = format!("{}*", REDIS_KEY_PREFIX);
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                conn.del::<_, ()>(keys).await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(removed, "Redis page cache cleared");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::Cache(format!("unexpected PING response: {}", pong)))
        }
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    data: Bytes,
    expires_at: Instant,
}

impl CachedEntry {
    #[inline]
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local page cache for single-instance deployments and tests.
///
/// Expired entries are swept on every write and the entry count is capped, so distinct keys
/// cannot grow the map without bound.
pub struct InMemoryPageCache {
    store: DashMap<String, CachedEntry>,
    max_entries: usize,
}

impl Default for InMemoryPageCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            store: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Drop expired entries, then evict ~10% of the rest if still at the limit.
    fn enforce_limits(&self) {
        self.store.retain(|_, entry| !entry.is_expired());

        if self.store.len() >= self.max_entries {
            let evict_count = (self.store.len() / 10).max(1);
            let victims: Vec<String> = self
                .store
                .iter()
                .take(evict_count)
                .map(|entry| entry.key().clone())
                .collect();
            for key in &victims {
                self.store.remove(key);
            }
            warn!(
                evicted = victims.len(),
                max_entries = self.max_entries,
                "In-memory page cache full, evicted live entries"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl PageCache for InMemoryPageCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.data.clone()));
            }
        }
        // Expired entries are evicted lazily
        self.store.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, body: Bytes, ttl: Duration) -> Result<()> {
        self.enforce_limits();
        self.store.insert(
            key.to_string(),
            CachedEntry {
                data: body,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.store.clear();
        Ok(())
    }
}

/// Cache for the rendered global index, one entry per requested page number.
///
/// Writes made after an entry was stored do not invalidate it; readers may see a page up to
/// `ttl` old.
pub struct IndexPageCache {
    backend: Arc<dyn PageCache>,
    ttl: Duration,
}

impl IndexPageCache {
    pub fn new(backend: Arc<dyn PageCache>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Cache key for an already parsed page number; anything below 1 shares page 1's entry.
    pub fn key(page_number: i64) -> String {
        format!("{}{}", INDEX_KEY_PREFIX, page_number.max(1))
    }

    /// Serve the cached body for `page_number`, rendering and storing it on a miss.
    ///
    /// Backend failures are logged and counted, never surfaced: the page is rendered fresh.
    /// Render failures are returned and nothing is stored.
    pub async fn get_or_render<F, Fut>(&self, page_number: i64, render: F) -> Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        let key = Self::key(page_number);

        match self.backend.get(&key).await {
            Ok(Some(body)) => {
                record_cache_event("hit");
                debug!(key = %key, "Index page cache HIT");
                return Ok(body);
            }
            Ok(None) => {
                record_cache_event("miss");
                debug!(key = %key, "Index page cache MISS");
            }
            Err(e) => {
                record_cache_event("error");
                warn!(key = %key, error = %e, "Index page cache read failed, rendering fresh");
            }
        }

        let body = render().await?;

        match self.backend.set(&key, body.clone(), self.ttl).await {
            Ok(()) => record_cache_event("write"),
            Err(e) => {
                record_cache_event("error");
                warn!(key = %key, error = %e, "Index page cache write failed");
            }
        }

        Ok(body)
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await?;
        record_cache_event("clear");
        info!("Index page cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenCache;

    #[async_trait]
    impl PageCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>> {
            Err(AppError::Cache("connection refused".into()))
        }

        async fn set(&self, _key: &str, _body: Bytes, _ttl: Duration) -> Result<()> {
            Err(AppError::Cache("connection refused".into()))
        }

        async fn clear(&self) -> Result<()> {
            Err(AppError::Cache("connection refused".into()))
        }
    }

    fn index_cache(ttl: Duration) -> IndexPageCache {
        IndexPageCache::new(Arc::new(InMemoryPageCache::new()), ttl)
    }

    #[test]
    fn key_uses_page_number() {
        assert_eq!(IndexPageCache::key(1), "index_page:1");
        assert_eq!(IndexPageCache::key(2), "index_page:2");
        assert_eq!(IndexPageCache::key(0), IndexPageCache::key(1));
        assert_eq!(IndexPageCache::key(-5), IndexPageCache::key(1));
    }

    #[tokio::test]
    async fn expired_entries_are_swept_on_write() {
        let cache = InMemoryPageCache::new();
        for i in 0..500 {
            cache
                .set(&format!("k{}", i), Bytes::from_static(b"x"), Duration::from_millis(10))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache
            .set("fresh", Bytes::from_static(b"y"), Duration::from_secs(20))
            .await
            .unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn live_entries_are_capped() {
        let cache = InMemoryPageCache::with_max_entries(10);
        for i in 0..50 {
            cache
                .set(&format!("k{}", i), Bytes::from_static(b"x"), Duration::from_secs(20))
                .await
                .unwrap();
        }

        assert!(cache.len() <= 10);
        assert!(cache.get("k49").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let cache = index_cache(Duration::from_secs(20));
        let renders = AtomicUsize::new(0);

        for _ in 0..2 {
            let body = cache
                .get_or_render(1, || async {
                    renders.fetch_add(1, Ordering::SeqCst);
                    Ok(Bytes::from_static(b"page one"))
                })
                .await
                .unwrap();
            assert_eq!(body, Bytes::from_static(b"page one"));
        }

        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = index_cache(Duration::from_millis(30));
        cache
            .get_or_render(1, || async { Ok(Bytes::from_static(b"old")) })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        let body = cache
            .get_or_render(1, || async { Ok(Bytes::from_static(b"new")) })
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn clear_forces_fresh_render() {
        let cache = index_cache(Duration::from_secs(20));
        cache
            .get_or_render(1, || async { Ok(Bytes::from_static(b"old")) })
            .await
            .unwrap();
        cache.clear().await.unwrap();

        let body = cache
            .get_or_render(1, || async { Ok(Bytes::from_static(b"new")) })
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn broken_backend_degrades_to_rendering() {
        let cache = IndexPageCache::new(Arc::new(BrokenCache), Duration::from_secs(20));
        let body = cache
            .get_or_render(1, || async { Ok(Bytes::from_static(b"fresh")) })
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"fresh"));
        assert!(cache.clear().await.is_err());
    }

    #[tokio::test]
    async fn failed_render_is_not_cached() {
        let backend = Arc::new(InMemoryPageCache::new());
        let cache = IndexPageCache::new(backend.clone(), Duration::from_secs(20));

        let result = cache
            .get_or_render(1, || async { Err(AppError::Render("boom".into())) })
            .await;
        assert!(result.is_err());
        assert!(backend.is_empty());
    }
}
