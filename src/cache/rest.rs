//! Redis-compatible store reached through an HTTP REST command endpoint.
//!
//! Each command is sent as `POST <url>` with a JSON array body such as
//! `["INCR", "ratelimit:groq:29000000"]` and a bearer token. The endpoint answers
//! `{"result": ...}` on success and `{"error": "..."}` on failure.

use super::backend::{KvStore, StoreError};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct RestKvStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestKvStore {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .build()
            .map_err(StoreError::Http)?;
        Ok(Self::with_client(client, url, token))
    }

    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn command(&self, args: Value) -> Result<Value> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await
            .map_err(StoreError::Http)?;

        let status = resp.status();
        let body: Value = resp.json().await.map_err(StoreError::Http)?;

        if let Some(err) = body.get("error").and_then(|e| e.as_str()) {
            return Err(StoreError::Command(err.to_string()).into());
        }
        if !status.is_success() {
            return Err(StoreError::Command(format!("HTTP {}", status.as_u16())).into());
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            // Values are written as JSON text; anything else is returned as a plain string.
            Value::String(s) => Ok(Some(
                serde_json::from_str(&s).unwrap_or(Value::String(s)),
            )),
            other => Ok(Some(other)),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        self.command(json!(["SET", key, payload, "EX", Self::ttl_secs(ttl)]))
            .await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let result = self.command(json!(["INCR", key])).await?;
        result
            .as_i64()
            .ok_or_else(|| StoreError::NotAnInteger(key.to_string()).into())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let result = self
            .command(json!(["EXPIRE", key, Self::ttl_secs(ttl)]))
            .await?;
        Ok(result.as_i64() == Some(1))
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
