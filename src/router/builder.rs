use super::core::TaskRouter;
use crate::cache::{CacheConfig, CacheManager, KvStore, MemoryStore, RestKvStore};
use crate::config::RouterConfig;
use crate::drivers::gemini::GeminiAdapter;
use crate::drivers::groq::GroqAdapter;
use crate::drivers::{ProviderAdapter, ProviderId};
use crate::resilience::{RateLimiter, RateLimits};
use crate::routing::RoutingTable;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tracing::info;

/// Builder for [`TaskRouter`].
///
/// Both provider adapters are required. Everything else has a default: the built-in
/// routing table, an in-process [`MemoryStore`], and the default per-minute budgets.
/// The cache and the rate limiter always share one store.
pub struct TaskRouterBuilder {
    table: RoutingTable,
    store: Option<Arc<dyn KvStore>>,
    cache_config: CacheConfig,
    limits: RateLimits,
    groq: Option<Arc<dyn ProviderAdapter>>,
    gemini: Option<Arc<dyn ProviderAdapter>>,
}

impl TaskRouterBuilder {
    pub fn new() -> Self {
        Self {
            table: RoutingTable::default(),
            store: None,
            cache_config: CacheConfig::default(),
            limits: RateLimits::default(),
            groq: None,
            gemini: None,
        }
    }

    /// Live adapters and store from a validated [`RouterConfig`].
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new()
            .limits(config.limits.to_rate_limits())
            .adapter(Arc::new(GroqAdapter::new(&config.groq, &config.http)?))
            .adapter(Arc::new(GeminiAdapter::new(&config.gemini, &config.http)?));

        if let Some(store) = &config.store {
            builder = builder.store(Arc::new(RestKvStore::new(&store.url, &store.token)?));
        }
        Ok(builder)
    }

    pub fn routing_table(mut self, table: RoutingTable) -> Self {
        self.table = table;
        self
    }

    /// Shared store for cached results and rate-limit counters.
    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn limits(mut self, limits: RateLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Register an adapter. It takes the slot named by its [`ProviderId`],
    /// replacing any adapter registered there before.
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        match adapter.id() {
            ProviderId::Groq => self.groq = Some(adapter),
            ProviderId::Gemini => self.gemini = Some(adapter),
        }
        self
    }

    pub fn build(self) -> Result<TaskRouter> {
        let groq = self.groq.ok_or_else(|| missing_adapter(ProviderId::Groq))?;
        let gemini = self
            .gemini
            .ok_or_else(|| missing_adapter(ProviderId::Gemini))?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::default()));
        info!(store = store.name(), "task router ready");

        Ok(TaskRouter {
            table: Arc::new(self.table),
            cache: CacheManager::new(self.cache_config, store.clone()),
            limiter: RateLimiter::new(store),
            limits: self.limits,
            groq,
            gemini,
        })
    }
}

impl Default for TaskRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_adapter(provider: ProviderId) -> Error {
    Error::configuration_with_context(
        format!("no adapter registered for provider '{}'", provider),
        ErrorContext::new()
            .with_field_path(format!("adapters.{}", provider))
            .with_source("router_builder"),
    )
}
