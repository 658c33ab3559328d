//! Groq 适配器 — OpenAI 兼容的 chat completions 接口
//!
//! Groq chat-completions adapter (OpenAI-compatible wire format):
//! - `POST {base}/chat/completions` with bearer auth.
//! - Reply text at `choices[0].message.content`.
//! - Streaming is SSE; each frame carries `choices[0].delta.content`, ended by `data: [DONE]`.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::config::ProviderSettings;
use crate::error::Error;
use crate::pipeline::{text_deltas, SseDecoder};
use crate::transport::{HttpOptions, HttpTransport, RequestAuth};
use crate::{BoxStream, Result};

use super::{CallOptions, ProviderAdapter, ProviderId};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

pub struct GroqAdapter {
    transport: HttpTransport,
    base_url: String,
    model: String,
    api_key: String,
}

impl GroqAdapter {
    pub fn new(settings: &ProviderSettings, http: &HttpOptions) -> Result<Self> {
        let transport = HttpTransport::new(ProviderId::Groq, http)?;
        Ok(Self::with_transport(transport, settings))
    }

    pub fn with_transport(transport: HttpTransport, settings: &ProviderSettings) -> Self {
        Self {
            transport,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: settings.api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body(&self, prompt: &str, options: &CallOptions, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "stream": stream,
        })
    }

    fn completion_text(body: &Value) -> Option<String> {
        body.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    fn delta_text(frame: &Value) -> Option<String> {
        frame
            .pointer("/choices/0/delta/content")
            .and_then(|v| v.as_str())
            .map(String::from)
    }
}

#[async_trait]
impl ProviderAdapter for GroqAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String> {
        let body = self.build_body(prompt, options, false);
        let auth = RequestAuth::Bearer(self.api_key.clone());
        let reply = self.transport.post_json(&self.endpoint(), &auth, &body).await?;

        match Self::completion_text(&reply) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(Error::provider(
                ProviderId::Groq,
                None,
                "completion carried no text",
            )),
        }
    }

    async fn call_stream(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<BoxStream<'static, Bytes>> {
        let body = self.build_body(prompt, options, true);
        let auth = RequestAuth::Bearer(self.api_key.clone());
        let raw = self.transport.post_stream(&self.endpoint(), &auth, &body).await?;
        let frames = SseDecoder::new().decode(raw);
        Ok(text_deltas(frames, Self::delta_text))
    }
}
