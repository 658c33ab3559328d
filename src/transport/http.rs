use crate::drivers::ProviderId;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::Proxy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upstream error bodies are cut to this many characters before they are kept.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Connection settings for provider HTTP clients.
///
/// No request timeout is applied unless one is configured; bounding request time is
/// left to the hosting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    #[serde(default)]
    pub proxy_url: Option<String>,
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            proxy_url: None,
        }
    }
}

/// How a provider expects its credential.
#[derive(Debug, Clone)]
pub enum RequestAuth {
    Bearer(String),
    Header(&'static str, String),
}

pub struct HttpTransport {
    client: reqwest::Client,
    provider: ProviderId,
}

impl HttpTransport {
    pub fn new(provider: ProviderId, options: &HttpOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(secs) = options.timeout_secs.filter(|s| *s > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(ref proxy_url) = options.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(TransportError::Http)?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self::with_client(provider, client))
    }

    pub fn with_client(provider: ProviderId, client: reqwest::Client) -> Self {
        Self { client, provider }
    }

    fn request(&self, url: &str, auth: &RequestAuth, body: &Value) -> reqwest::RequestBuilder {
        let req = self
            .client
            .post(url)
            .json(body)
            .header("x-router-request-id", uuid::Uuid::new_v4().to_string());
        match auth {
            RequestAuth::Bearer(token) => req.bearer_auth(token),
            RequestAuth::Header(name, value) => req.header(*name, value),
        }
    }

    /// POST a JSON body and return the decoded JSON reply.
    pub async fn post_json(&self, url: &str, auth: &RequestAuth, body: &Value) -> Result<Value> {
        let start = Instant::now();
        let resp = self
            .request(url, auth, body)
            .send()
            .await
            .map_err(TransportError::Http)?;
        let resp = self.ensure_success(resp).await?;

        debug!(
            provider = %self.provider,
            duration_ms = start.elapsed().as_millis() as u64,
            "provider request completed"
        );

        resp.json::<Value>().await.map_err(|e| {
            Error::provider(
                self.provider,
                None,
                format!("response body is not JSON: {}", e),
            )
        })
    }

    /// POST a JSON body and return the raw response body as a byte stream.
    pub async fn post_stream(
        &self,
        url: &str,
        auth: &RequestAuth,
        body: &Value,
    ) -> Result<BoxStream<'static, Bytes>> {
        let resp = self
            .request(url, auth, body)
            .header("accept", "text/event-stream")
            .send()
            .await
            .map_err(TransportError::Http)?;
        let resp = self.ensure_success(resp).await?;

        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }

    async fn ensure_success(&self, resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        Err(Error::provider(
            self.provider,
            Some(status.as_u16()),
            if message.is_empty() {
                status.to_string()
            } else {
                message
            },
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
