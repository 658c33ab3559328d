use crate::cache::{CacheManager, CacheStats};
use crate::config::RouterConfig;
use crate::drivers::{ProviderAdapter, ProviderId};
use crate::resilience::{RateLimitDecision, RateLimiter, RateLimits};
use crate::routing::{Route, RoutingTable, Task};
use crate::{BoxStream, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome of [`TaskRouter::call_cached`].
///
/// On a cache hit `provider` is the route's primary by convention; the cache does
/// not record which provider produced the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterResult<T> {
    pub data: T,
    pub cached: bool,
    pub provider: ProviderId,
}

/// Outcome of [`TaskRouter::call_stream`]: an open text stream and who serves it.
pub struct StreamResult {
    pub stream: BoxStream<'static, Bytes>,
    pub provider: ProviderId,
}

impl fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResult")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Routes task calls to providers.
///
/// Holds no mutable state of its own: the routing table is read-only and every
/// counter or cached value lives in the shared store, so one instance can serve
/// any number of concurrent requests.
pub struct TaskRouter {
    pub(crate) table: Arc<RoutingTable>,
    pub(crate) cache: CacheManager,
    pub(crate) limiter: RateLimiter,
    pub(crate) limits: RateLimits,
    pub(crate) groq: Arc<dyn ProviderAdapter>,
    pub(crate) gemini: Arc<dyn ProviderAdapter>,
}

impl TaskRouter {
    /// Build a router with live provider adapters and the configured store.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        super::builder::TaskRouterBuilder::from_config(config)?.build()
    }

    /// Routing policy for `task`, for response metadata and logging.
    pub fn route_info(&self, task: Task) -> &Route {
        self.table.route(task)
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }

    /// Ingress throttling for one caller identity (client address, user id, ...).
    pub async fn check_identity(&self, identity: &str) -> RateLimitDecision {
        let scope = format!("ingress:{}", identity);
        self.limiter.check_limit(&scope, self.limits.ingress).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn adapter(&self, provider: ProviderId) -> Arc<dyn ProviderAdapter> {
        match provider {
            ProviderId::Groq => self.groq.clone(),
            ProviderId::Gemini => self.gemini.clone(),
        }
    }

    pub(crate) async fn check_provider(&self, provider: ProviderId) -> RateLimitDecision {
        self.limiter
            .check_limit(provider.as_str(), self.limits.for_provider(provider))
            .await
    }
}
