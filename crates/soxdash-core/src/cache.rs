//! In-memory response cache with a fresh window and a longer stale window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Younger than the fresh window; serve without an upstream call.
    Fresh(String),
    /// Past the fresh window but inside the stale window. Only served when
    /// the upstream call is rate limited.
    Stale(String),
    Miss,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    stored_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    fresh_for: Duration,
    stale_for: Duration,
}

impl CacheInner {
    fn lookup(&self, key: &str, now: Instant) -> CacheLookup {
        let Some(entry) = self.map.get(key) else {
            return CacheLookup::Miss;
        };
        let age = now.saturating_duration_since(entry.stored_at);
        if age <= self.fresh_for {
            CacheLookup::Fresh(entry.body.clone())
        } else if age <= self.fresh_for + self.stale_for {
            CacheLookup::Stale(entry.body.clone())
        } else {
            CacheLookup::Miss
        }
    }

    fn clear_expired(&mut self, now: Instant) {
        let horizon = self.fresh_for + self.stale_for;
        self.map
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) <= horizon);
    }
}

/// Thread-safe response cache keyed by request URL.
#[derive(Debug, Clone)]
pub struct QuoteCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl QuoteCache {
    pub fn new(fresh_for: Duration, stale_for: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                fresh_for,
                stale_for,
            })),
        }
    }

    /// 30 s fresh, 300 s stale-while-rate-limited.
    pub fn with_default_windows() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(300))
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub async fn lookup(&self, key: &str) -> CacheLookup {
        let store = self.inner.read().await;
        store.lookup(key, Instant::now())
    }

    pub async fn put(&self, key: String, body: String) {
        let mut store = self.inner.write().await;
        if store.fresh_for.is_zero() && store.stale_for.is_zero() {
            return;
        }
        store.clear_expired(Instant::now());
        store.map.insert(
            key,
            CacheEntry {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_moves_from_fresh_to_stale_to_miss() {
        let cache = QuoteCache::new(Duration::from_millis(60), Duration::from_millis(120));
        cache.put("soxl".to_string(), "{}".to_string()).await;

        assert_eq!(cache.lookup("soxl").await, CacheLookup::Fresh("{}".to_string()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.lookup("soxl").await, CacheLookup::Stale("{}".to_string()));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.lookup("soxl").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = QuoteCache::disabled();
        cache.put("soxl".to_string(), "{}".to_string()).await;
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.lookup("soxl").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn put_overwrites_and_clear_empties() {
        let cache = QuoteCache::with_default_windows();
        cache.put("k".to_string(), "a".to_string()).await;
        cache.put("k".to_string(), "b".to_string()).await;
        assert_eq!(cache.lookup("k").await, CacheLookup::Fresh("b".to_string()));

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
