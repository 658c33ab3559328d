//! Key-value store backends.

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store command failed: {0}")]
    Command(String),

    #[error("value at '{0}' is not an integer")]
    NotAnInteger(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared, TTL-capable key-value store.
///
/// Every operation is a single atomic command against the backing store; there
/// are no read-modify-write sequences. A missing key is a cold miss, never an error.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;
    /// Atomically increment the integer at `key`, creating it at 1 if absent.
    async fn incr(&self, key: &str) -> Result<i64>;
    /// Set the expiry of an existing key. Returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
    fn name(&self) -> &'static str;
}

#[derive(Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
    last_accessed: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|t| Instant::now() >= t).unwrap_or(false)
    }
}

/// In-process store with per-key expiry and oldest-access eviction.
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries: max_entries.max(1),
        }
    }

    fn poisoned() -> crate::Error {
        StoreError::Unavailable("memory store lock poisoned".into()).into()
    }

    fn evict_if_needed(&self, entries: &mut HashMap<String, Entry>) {
        entries.retain(|_, e| !e.is_expired());
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                entries.remove(&k);
            } else {
                break;
            }
        }
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.values().filter(|e| !e.is_expired()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time to live of `key`, if it exists and has an expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key).filter(|e| !e.is_expired())?;
        entry
            .expires_at
            .map(|t| t.saturating_duration_since(Instant::now()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired() {
                entries.remove(key);
                return Ok(None);
            }
            entry.last_accessed = Instant::now();
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if !entries.contains_key(key) {
            self.evict_if_needed(&mut entries);
        }
        let now = Instant::now();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: Some(now + ttl),
                last_accessed: now,
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let live = entries.get(key).map(|e| !e.is_expired()).unwrap_or(false);
        if !live {
            entries.remove(key);
            self.evict_if_needed(&mut entries);
            let now = Instant::now();
            // Redis semantics: a fresh counter carries no expiry until EXPIRE.
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::from(1),
                    expires_at: None,
                    last_accessed: now,
                },
            );
            return Ok(1);
        }

        let entry = entries
            .get_mut(key)
            .ok_or_else(|| StoreError::Command(format!("key '{}' vanished", key)))?;
        let current = entry
            .value
            .as_i64()
            .ok_or_else(|| StoreError::NotAnInteger(key.to_string()))?;
        let next = current + 1;
        entry.value = Value::from(next);
        entry.last_accessed = Instant::now();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Store that holds nothing: every read misses, every counter starts over.
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for NullStore {
    async fn get(&self, _: &str) -> Result<Option<Value>> {
        Ok(None)
    }
    async fn set(&self, _: &str, _: &Value, _: Duration) -> Result<()> {
        Ok(())
    }
    async fn incr(&self, _: &str) -> Result<i64> {
        Ok(1)
    }
    async fn expire(&self, _: &str, _: Duration) -> Result<bool> {
        Ok(false)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_get_missing_is_miss() {
        let store = MemoryStore::new(10);
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_set_then_get() {
        let store = MemoryStore::new(10);
        store
            .set("a:slug", &json!({"summary": "s"}), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            store.get("a:slug").await.unwrap(),
            Some(json!({"summary": "s"}))
        );
    }

    #[tokio::test]
    async fn test_memory_entry_expires() {
        let store = MemoryStore::new(10);
        store
            .set("k", &json!(1), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_incr_counts_and_expire() {
        let store = MemoryStore::new(10);
        assert_eq!(store.incr("w").await.unwrap(), 1);
        assert_eq!(store.ttl("w"), None);
        assert_eq!(store.incr("w").await.unwrap(), 2);
        assert!(store.expire("w", Duration::from_secs(65)).await.unwrap());
        assert!(store.ttl("w").unwrap() > Duration::from_secs(60));
        assert_eq!(store.incr("w").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_memory_incr_restarts_after_expiry() {
        let store = MemoryStore::new(10);
        store.incr("w").await.unwrap();
        store.expire("w", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.incr("w").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_incr_non_integer_fails() {
        let store = MemoryStore::new(10);
        store
            .set("k", &json!("text"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(store.incr("k").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_expire_missing_key() {
        let store = MemoryStore::new(10);
        assert!(!store.expire("none", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_evicts_when_full() {
        let store = MemoryStore::new(2);
        for k in ["a", "b", "c"] {
            store.set(k, &json!(k), Duration::from_secs(60)).await.unwrap();
        }
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("c").await.unwrap(), Some(json!("c")));
    }

    #[tokio::test]
    async fn test_null_store_always_misses() {
        let store = NullStore::new();
        store.set("k", &json!(1), Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.incr("k").await.unwrap(), 1);
    }
}
