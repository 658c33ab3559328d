//! Primary → fallback execution shared by the cached and streaming paths.

use super::core::TaskRouter;
use crate::drivers::{ProviderAdapter, ProviderId};
use crate::routing::Task;
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

impl TaskRouter {
    /// Run `attempt` against the task's primary provider, then at most once against
    /// its fallback.
    ///
    /// - Primary over budget, failing, or returning an unusable reply: try the fallback.
    /// - Fallback over budget: `Error::RateLimited` with the larger of the two hints.
    /// - Fallback failing: its error is returned unchanged.
    pub(crate) async fn with_failover<T, F, Fut>(
        &self,
        task: Task,
        attempt: F,
    ) -> Result<(T, ProviderId)>
    where
        F: Fn(Arc<dyn ProviderAdapter>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let route = *self.table.route(task);

        let primary_check = self.check_provider(route.primary).await;
        if primary_check.allowed {
            match attempt(self.adapter(route.primary)).await {
                Ok(value) => return Ok((value, route.primary)),
                Err(e) if e.is_parse() => warn!(
                    %task,
                    provider = %route.primary,
                    fallback = %route.fallback,
                    error = %e,
                    "primary provider returned an unexpected shape, falling back"
                ),
                Err(e) => warn!(
                    %task,
                    provider = %route.primary,
                    fallback = %route.fallback,
                    error = %e,
                    "primary provider failed, falling back"
                ),
            }
        } else {
            info!(
                %task,
                provider = %route.primary,
                fallback = %route.fallback,
                "primary provider over budget, falling back"
            );
        }

        let fallback_check = self.check_provider(route.fallback).await;
        if !fallback_check.allowed {
            let retry_after_secs = primary_check
                .retry_after_secs
                .max(fallback_check.retry_after_secs);
            warn!(%task, retry_after_secs, "both providers unavailable, rate limited");
            return Err(Error::RateLimited { retry_after_secs });
        }

        match attempt(self.adapter(route.fallback)).await {
            Ok(value) => Ok((value, route.fallback)),
            Err(e) => {
                if e.is_parse() {
                    warn!(%task, provider = %route.fallback, error = %e, "fallback provider returned an unexpected shape");
                } else {
                    warn!(%task, provider = %route.fallback, error = %e, "fallback provider failed");
                }
                Err(e)
            }
        }
    }
}
