//! Gemini 适配器 — Google generateContent 接口
//!
//! Google Gemini generateContent adapter. Key differences from the OpenAI shape:
//! - Uses `contents` with `parts` instead of `messages`.
//! - `generationConfig` wraps temperature and `maxOutputTokens`.
//! - Reply text is spread over `candidates[0].content.parts[*].text`.
//! - Streaming uses `:streamGenerateContent?alt=sse`; each SSE frame is a full
//!   response object holding the next fragment.
//! - The API key travels in the `x-goog-api-key` header.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::config::ProviderSettings;
use crate::error::Error;
use crate::pipeline::{text_deltas, SseDecoder};
use crate::transport::{HttpOptions, HttpTransport, RequestAuth};
use crate::{BoxStream, Result};

use super::{CallOptions, ProviderAdapter, ProviderId};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiAdapter {
    transport: HttpTransport,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiAdapter {
    pub fn new(settings: &ProviderSettings, http: &HttpOptions) -> Result<Self> {
        let transport = HttpTransport::new(ProviderId::Gemini, http)?;
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

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn auth(&self) -> RequestAuth {
        RequestAuth::Header("x-goog-api-key", self.api_key.clone())
    }

    fn build_body(prompt: &str, options: &CallOptions) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            },
        })
    }

    /// Concatenate every text part of the first candidate.
    fn candidate_text(body: &Value) -> Option<String> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        Some(text)
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String> {
        let body = Self::build_body(prompt, options);
        let reply = self
            .transport
            .post_json(&self.generate_url(), &self.auth(), &body)
            .await?;

        match Self::candidate_text(&reply) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                let reason = reply
                    .pointer("/candidates/0/finishReason")
                    .or_else(|| reply.pointer("/promptFeedback/blockReason"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("no candidates");
                Err(Error::provider(
                    ProviderId::Gemini,
                    None,
                    format!("completion carried no text ({})", reason),
                ))
            }
        }
    }

    async fn call_stream(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<BoxStream<'static, Bytes>> {
        let body = Self::build_body(prompt, options);
        let raw = self
            .transport
            .post_stream(&self.stream_url(), &self.auth(), &body)
            .await?;
        let frames = SseDecoder::new().decode(raw);
        Ok(text_deltas(frames, Self::candidate_text))
    }
}
