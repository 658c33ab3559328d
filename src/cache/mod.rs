//! 缓存模块：可插拔的键值存储与缓存旁路（cache-aside）读写。
//!
//! # Cache Module
//!
//! Provides the shared key-value store abstraction used for both cached task
//! results and rate-limit counters, plus the fail-open [`CacheManager`].
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`KvStore`] | Store contract: `get`, `set` with expiry, atomic `incr`, `expire` |
//! | [`MemoryStore`] | In-process store with per-key expiry |
//! | [`RestKvStore`] | Redis-compatible store behind an HTTP REST command endpoint |
//! | [`NullStore`] | Always-miss store, disables caching |
//! | [`CacheManager`] | Typed reads that degrade to misses, best-effort writes |
//! | [`key`] | Key builders for the per-task key conventions |
//!
//! ## Example
//!
//! ```rust
//! use llm_task_router::cache::{key, CacheConfig, CacheManager, MemoryStore};
//! use std::sync::Arc;
//!
//! let cache = CacheManager::new(CacheConfig::default(), Arc::new(MemoryStore::new(1000)));
//! assert_eq!(key::translate("slug-1", "ms"), "t:slug-1:ms");
//! # let _ = cache;
//! ```

mod backend;
pub mod key;
mod manager;
mod rest;

pub use backend::{KvStore, MemoryStore, NullStore, StoreError};
pub use manager::{CacheConfig, CacheManager, CacheStats};
pub use rest::RestKvStore;
