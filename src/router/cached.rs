use super::core::{RouterResult, TaskRouter};
use crate::routing::Task;
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::info;

impl TaskRouter {
    /// Cache-aside call for `task`.
    ///
    /// A cached value at `cache_key` is returned as-is without touching any provider.
    /// On a miss the prompt goes through [`with_failover`](TaskRouter::with_failover),
    /// the reply is turned into `T` by `parse`, and the result is written back with
    /// `ttl`. The key is used verbatim.
    ///
    /// `parse` must be a pure function of the reply text. A parse failure on the
    /// primary's reply counts as a provider failure and triggers the fallback.
    pub async fn call_cached<T, P>(
        &self,
        task: Task,
        cache_key: &str,
        prompt: &str,
        ttl: Duration,
        parse: P,
    ) -> Result<RouterResult<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        P: Fn(&str) -> Result<T> + Send + Sync,
    {
        if let Some(data) = self.cache.get::<T>(cache_key).await {
            let provider = self.table.route(task).primary;
            info!(%task, cache_key, %provider, "served from cache");
            return Ok(RouterResult {
                data,
                cached: true,
                provider,
            });
        }

        let options = task.call_options();
        let parse = &parse;
        let (data, provider) = self
            .with_failover(task, move |adapter| async move {
                let raw = adapter.call(prompt, &options).await?;
                parse(&raw)
            })
            .await?;

        // Best-effort: a failed write is logged by the cache and does not fail the call.
        self.cache.set(cache_key, &data, ttl).await;

        info!(%task, cache_key, %provider, "served from provider");
        Ok(RouterResult {
            data,
            cached: false,
            provider,
        })
    }
}
