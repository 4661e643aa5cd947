//! Response cache for repeated questions.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use webs_core::{config::CacheConfig, traits::ResponseCache, Result};

use crate::intent::normalize;

/// Cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Reply as produced by the backend.
    reply: String,
    /// When the entry was written.
    created_at: Instant,
    /// Time-to-live; `None` never expires.
    ttl: Option<Duration>,
    /// Hit count for analytics.
    hit_count: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.ttl
            .map(|ttl| self.created_at.elapsed() > ttl)
            .unwrap_or(false)
    }
}

/// In-memory response cache keyed by normalized message text.
///
/// Unbounded and non-expiring unless configured otherwise.
#[derive(Default)]
pub struct InMemoryResponseCache {
    cache: DashMap<String, CacheEntry>,
    ttl: Option<Duration>,
    max_entries: Option<usize>,
}

impl InMemoryResponseCache {
    /// Create an unbounded cache without expiry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new();
        if let Some(secs) = config.ttl_secs {
            cache = cache.with_ttl(Duration::from_secs(secs));
        }
        if let Some(max) = config.max_entries {
            cache = cache.with_max_entries(max);
        }
        cache
    }

    /// Expire entries after `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Bound the number of entries; the oldest is evicted when full.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max.max(1));
        self
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total_entries = self.cache.len();
        let total_hits: u64 = self.cache.iter().map(|r| r.hit_count).sum();

        CacheStats {
            total_entries,
            total_hits,
        }
    }

    /// Clear expired entries.
    pub fn cleanup(&self) {
        self.cache.retain(|_: &String, v: &mut CacheEntry| !v.is_expired());
    }

    fn evict_oldest(&self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.cache.remove(&key);
            tracing::debug!(key = %key, "Evicted oldest cache entry");
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Total number of entries.
    pub total_entries: usize,
    /// Total number of cache hits.
    pub total_hits: u64,
}

/// Spawn a task that drops expired entries every `interval` until
/// `shutdown` flips to true or its sender is dropped.
pub fn spawn_cache_sweeper(
    cache: Arc<InMemoryResponseCache>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let before = cache.cache.len();
                    cache.cleanup();
                    tracing::debug!(
                        removed = before.saturating_sub(cache.cache.len()),
                        live = cache.cache.len(),
                        "Cache sweep"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Cache sweeper stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, message: &str) -> Result<Option<String>> {
        let key = normalize(message);

        if let Some(mut entry) = self.cache.get_mut(&key) {
            if !entry.is_expired() {
                entry.hit_count += 1;
                tracing::debug!(key = %key, "Response cache hit");
                return Ok(Some(entry.reply.clone()));
            }
        }

        // Drop the expired entry outside the shard guard.
        self.cache.remove_if(&key, |_, entry| entry.is_expired());

        tracing::debug!(key = %key, "Response cache miss");
        Ok(None)
    }

    async fn set(&self, message: &str, reply: &str) -> Result<()> {
        let key = normalize(message);

        if let Some(max) = self.max_entries {
            if !self.cache.contains_key(&key) && self.cache.len() >= max {
                self.evict_oldest();
            }
        }

        tracing::debug!(key = %key, reply_len = reply.len(), "Caching reply");

        self.cache.insert(
            key,
            CacheEntry {
                reply: reply.to_string(),
                created_at: Instant::now(),
                ttl: self.ttl,
                hit_count: 0,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<()> {
        let pattern = normalize(pattern);
        self.cache
            .retain(|key: &String, _: &mut CacheEntry| !key.contains(&pattern));
        tracing::debug!(pattern = %pattern, "Invalidated cache entries");
        Ok(())
    }
}
