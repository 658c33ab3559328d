//! 弹性模块：基于共享键值存储的固定窗口限流。
//!
//! # Resilience Module
//!
//! Request budgets enforced through the shared key-value store, so every process
//! serving traffic draws from the same per-provider allowance.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RateLimiter`] | Fixed-window counter on the store's atomic increment, fail-open |
//! | [`RateLimitPolicy`] | Budget and retry hint for one scope |
//! | [`RateLimits`] | Budgets for both providers and for ingress callers |
//!
//! ```rust
//! use llm_task_router::cache::MemoryStore;
//! use llm_task_router::resilience::{RateLimiter, RateLimitPolicy};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let limiter = RateLimiter::new(Arc::new(MemoryStore::new(1000)));
//! let decision = limiter.check_limit("groq", RateLimitPolicy::per_minute(25, 20)).await;
//! assert!(decision.allowed);
//! # });
//! ```

pub mod rate_limiter;

pub use rate_limiter::{RateLimitDecision, RateLimitPolicy, RateLimiter, RateLimits};
