//! Shared fixtures for router integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use llm_task_router::cache::{KvStore, MemoryStore, StoreError};
use llm_task_router::resilience::{RateLimitPolicy, RateLimits};
use llm_task_router::transport::TransportError;
use llm_task_router::{
    BoxStream, CallOptions, Error, ProviderAdapter, ProviderId, Result, TaskRouter,
    TaskRouterBuilder,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted adapter does on every call.
#[derive(Clone)]
pub enum Behavior {
    /// Reply with this text; streams emit it as one chunk per element.
    Reply(Vec<&'static str>),
    /// Fail with a transport error, as if the network dropped.
    NetworkError,
    /// Fail with a non-2xx status.
    Status(u16),
}

pub struct ScriptedAdapter {
    id: ProviderId,
    behavior: Behavior,
    calls: AtomicUsize,
    stream_calls: AtomicUsize,
    last_options: Mutex<Option<CallOptions>>,
}

impl ScriptedAdapter {
    pub fn new(id: ProviderId, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id,
            behavior,
            calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        })
    }

    pub fn replying(id: ProviderId, text: &'static str) -> Arc<Self> {
        Self::new(id, Behavior::Reply(vec![text]))
    }

    pub fn failing(id: ProviderId) -> Arc<Self> {
        Self::new(id, Behavior::NetworkError)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<CallOptions> {
        *self.last_options.lock().unwrap()
    }

    fn outcome(&self) -> Result<Vec<&'static str>> {
        match &self.behavior {
            Behavior::Reply(parts) => Ok(parts.clone()),
            Behavior::NetworkError => Err(Error::Transport(TransportError::Other(format!(
                "{}: connection reset",
                self.id
            )))),
            Behavior::Status(status) => Err(Error::provider(
                self.id,
                Some(*status),
                "upstream error",
            )),
        }
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn call(&self, _prompt: &str, options: &CallOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(*options);
        self.outcome().map(|parts| parts.concat())
    }

    async fn call_stream(
        &self,
        _prompt: &str,
        options: &CallOptions,
    ) -> Result<BoxStream<'static, Bytes>> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(*options);
        let parts = self.outcome()?;
        Ok(Box::pin(
            futures::stream::iter(parts).map(|p| Ok(Bytes::from_static(p.as_bytes()))),
        ))
    }
}

/// Store whose every command fails, as if the network to it were down.
pub struct DownStore;

#[async_trait]
impl KvStore for DownStore {
    async fn get(&self, _: &str) -> Result<Option<Value>> {
        Err(StoreError::Unavailable("connection refused".into()).into())
    }
    async fn set(&self, _: &str, _: &Value, _: Duration) -> Result<()> {
        Err(StoreError::Unavailable("connection refused".into()).into())
    }
    async fn incr(&self, _: &str) -> Result<i64> {
        Err(StoreError::Unavailable("connection refused".into()).into())
    }
    async fn expire(&self, _: &str, _: Duration) -> Result<bool> {
        Err(StoreError::Unavailable("connection refused".into()).into())
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

/// Budgets with a fixed number of requests per minute for each provider.
pub fn limits(groq: u64, gemini: u64) -> RateLimits {
    RateLimits {
        groq: RateLimitPolicy::per_minute(groq, 20),
        gemini: RateLimitPolicy::per_minute(gemini, 30),
        ..RateLimits::default()
    }
}

pub fn router(
    groq: Arc<ScriptedAdapter>,
    gemini: Arc<ScriptedAdapter>,
    store: Arc<dyn KvStore>,
    limits: RateLimits,
) -> TaskRouter {
    TaskRouterBuilder::new()
        .adapter(groq)
        .adapter(gemini)
        .store(store)
        .limits(limits)
        .build()
        .unwrap()
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(1_000))
}

pub async fn collect_text(mut stream: BoxStream<'static, Bytes>) -> String {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    String::from_utf8(out).unwrap()
}
