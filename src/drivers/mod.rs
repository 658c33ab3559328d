//! Provider 适配层 — 两个可互换的上游模型 API
//!
//! Provider adapter layer. Both adapters share one shape: a blocking `call` that
//! returns the completion text and a `call_stream` that returns the completion as
//! a flat stream of text bytes. Response parsing beyond "extract the text" is left
//! to the caller, since the expected JSON shape differs per task.

pub mod gemini;
pub mod groq;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{BoxStream, Result};

pub use gemini::GeminiAdapter;
pub use groq::GroqAdapter;

/// Upstream model API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI-compatible, low latency and cost.
    Groq,
    /// Stronger multilingual output, larger context.
    Gemini,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Groq, ProviderId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Groq => "groq",
            ProviderId::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderId::Groq),
            "gemini" => Ok(ProviderId::Gemini),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Sampling parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CallOptions {
    pub fn new(temperature: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }

    /// Batch analysis and translation: deterministic-leaning, roomy output.
    pub fn batch() -> Self {
        Self::new(0.3, 2048)
    }

    /// Interactive chat: livelier sampling, short answers.
    pub fn chat() -> Self {
        Self::new(0.7, 512)
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::batch()
    }
}

/// One upstream model API.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Single completion for `prompt`.
    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String>;

    /// Streamed completion for `prompt` as text fragments.
    async fn call_stream(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<BoxStream<'static, Bytes>>;
}
