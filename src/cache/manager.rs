//! Fail-open typed cache over a [`KvStore`].

use super::backend::KvStore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Serialized entries larger than this are not written.
    pub max_entry_size: usize,
    /// Namespace prepended as `<prefix>:<key>`. Keys themselves are never rewritten.
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entry_size: 1024 * 1024,
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Cache-aside helper: reads degrade to misses, writes are best-effort.
///
/// Neither `get` nor `set` can fail the caller; store errors are logged and counted.
pub struct CacheManager {
    config: CacheConfig,
    store: Arc<dyn KvStore>,
    stats: AtomicStats,
}

impl CacheManager {
    pub fn new(config: CacheConfig, store: Arc<dyn KvStore>) -> Self {
        Self {
            config,
            store,
            stats: AtomicStats::default(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        let full_key = self.full_key(key);
        match self.store.get(&full_key).await {
            // A stored null is a cold miss, never a cached answer.
            Ok(None) | Ok(Some(Value::Null)) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!(cache_key = %full_key, "cache miss");
                None
            }
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(val) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(cache_key = %full_key, store = self.store.name(), "cache hit");
                    Some(val)
                }
                Err(e) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(cache_key = %full_key, error = %e, "cached entry has unexpected shape, treating as miss");
                    None
                }
            },
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(cache_key = %full_key, store = self.store.name(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write `value` with `ttl`. Returns whether the entry was stored.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        if !self.config.enabled {
            return false;
        }
        let full_key = self.full_key(key);
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(cache_key = %full_key, error = %e, "cache value not serializable, skipping write");
                return false;
            }
        };
        let size = value.to_string().len();
        if size > self.config.max_entry_size {
            debug!(cache_key = %full_key, size, "cache entry too large, skipping write");
            return false;
        }
        match self.store.set(&full_key, &value, ttl).await {
            Ok(()) => {
                self.stats.sets.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(cache_key = %full_key, store = self.store.name(), error = %e, "cache write failed");
                false
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    fn full_key(&self, key: &str) -> String {
        match self.config.key_prefix {
            Some(ref p) => format!("{}:{}", p, key),
            None => key.to_string(),
        }
    }
}
