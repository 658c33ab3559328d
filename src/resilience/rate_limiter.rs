use crate::cache::KvStore;
use crate::drivers::ProviderId;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Length of one counting window.
pub const WINDOW_MS: u64 = 60_000;

/// Counters outlive their window by this much so a late increment never lands on an
/// expired key, then clean themselves up.
const WINDOW_GRACE: Duration = Duration::from_secs(5);

/// Budget for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Requests allowed per window.
    pub limit: u64,
    /// Hint returned when the budget is exhausted.
    pub retry_after_secs: u64,
}

impl RateLimitPolicy {
    pub fn per_minute(limit: u64, retry_after_secs: u64) -> Self {
        Self {
            limit,
            retry_after_secs,
        }
    }
}

/// Per-scope budgets, each set below the provider's advertised ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    /// Groq allows 30 requests per minute on the plan in use.
    pub groq: RateLimitPolicy,
    /// Gemini allows 15 requests per minute on the plan in use.
    pub gemini: RateLimitPolicy,
    /// Per caller identity, for ingress throttling.
    pub ingress: RateLimitPolicy,
}

impl RateLimits {
    pub fn for_provider(&self, provider: ProviderId) -> RateLimitPolicy {
        match provider {
            ProviderId::Groq => self.groq,
            ProviderId::Gemini => self.gemini,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            groq: RateLimitPolicy::per_minute(25, 20),
            gemini: RateLimitPolicy::per_minute(12, 30),
            ingress: RateLimitPolicy::per_minute(20, 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Zero when allowed.
    pub retry_after_secs: u64,
}

impl RateLimitDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }

    pub fn deny(retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            retry_after_secs,
        }
    }
}

/// Fixed-window request counter shared through the key-value store.
///
/// - One counter per `(scope, window)` at `ratelimit:<scope>:<window>`
/// - Counters expire on their own; nothing is ever deleted
/// - Store failures fail open: the request is allowed
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn window_id(now_ms: u64) -> u64 {
        now_ms / WINDOW_MS
    }

    pub fn window_key(scope: &str, window_id: u64) -> String {
        format!("ratelimit:{}:{}", scope, window_id)
    }

    /// Count one request against `scope` in the current window.
    pub async fn check_limit(&self, scope: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.check_limit_at(scope, policy, unix_now_ms()).await
    }

    pub async fn check_limit_at(
        &self,
        scope: &str,
        policy: RateLimitPolicy,
        now_ms: u64,
    ) -> RateLimitDecision {
        let key = Self::window_key(scope, Self::window_id(now_ms));

        let count = match self.store.incr(&key).await {
            Ok(n) => n,
            Err(e) => {
                warn!(scope, error = %e, "rate limit store unavailable, allowing request");
                return RateLimitDecision::allow();
            }
        };

        if count == 1 {
            let ttl = Duration::from_millis(WINDOW_MS) + WINDOW_GRACE;
            if let Err(e) = self.store.expire(&key, ttl).await {
                warn!(scope, error = %e, "failed to set rate window expiry");
            }
        }

        if count.max(0) as u64 > policy.limit {
            debug!(scope, count, limit = policy.limit, "rate limit exceeded");
            RateLimitDecision::deny(policy.retry_after_secs)
        } else {
            RateLimitDecision::allow()
        }
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
