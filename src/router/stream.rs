use super::core::{StreamResult, TaskRouter};
use crate::routing::Task;
use crate::Result;
use tracing::info;

impl TaskRouter {
    /// Open a streamed completion for `task`.
    ///
    /// Same budget checks and failover as [`call_cached`](TaskRouter::call_cached),
    /// without caching. Failover only applies while opening the stream; an error
    /// after the first bytes arrives as a stream item.
    pub async fn call_stream(&self, task: Task, prompt: &str) -> Result<StreamResult> {
        let options = task.call_options();
        let (stream, provider) = self
            .with_failover(task, move |adapter| async move {
                adapter.call_stream(prompt, &options).await
            })
            .await?;

        info!(%task, %provider, "stream opened");
        Ok(StreamResult { stream, provider })
    }
}
