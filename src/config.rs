//! Router configuration.
//!
//! Loaded from a YAML file, from the environment, or both (environment wins):
//!
//! ```yaml
//! groq:
//!   api_key: gsk-...
//!   model: llama-3.3-70b-versatile
//! gemini:
//!   api_key: AIza...
//! store:
//!   url: https://kv.example.com
//!   token: ...
//! limits:
//!   groq_per_minute: 25
//! ```

use crate::resilience::{RateLimitPolicy, RateLimits};
use crate::transport::HttpOptions;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's public endpoint (proxies, mock servers).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// REST endpoint of the shared key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub url: String,
    pub token: String,
}

/// Per-minute budgets. Unset values keep the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LimitSettings {
    #[serde(default)]
    pub groq_per_minute: Option<u64>,
    #[serde(default)]
    pub gemini_per_minute: Option<u64>,
    #[serde(default)]
    pub ingress_per_minute: Option<u64>,
}

impl LimitSettings {
    pub fn to_rate_limits(&self) -> RateLimits {
        let defaults = RateLimits::default();
        let apply = |base: RateLimitPolicy, limit: Option<u64>| RateLimitPolicy {
            limit: limit.unwrap_or(base.limit),
            ..base
        };
        RateLimits {
            groq: apply(defaults.groq, self.groq_per_minute),
            gemini: apply(defaults.gemini, self.gemini_per_minute),
            ingress: apply(defaults.ingress, self.ingress_per_minute),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RouterConfig {
    #[serde(default)]
    pub groq: ProviderSettings,
    #[serde(default)]
    pub gemini: ProviderSettings,
    /// Without a store, results are cached in process memory only.
    #[serde(default)]
    pub store: Option<StoreSettings>,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub http: HttpOptions,
}

impl RouterConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid router config: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    /// Configuration from environment variables alone.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay environment variables onto this configuration.
    ///
    /// - `GROQ_API_KEY`, `GROQ_BASE_URL`, `GROQ_MODEL`
    /// - `GEMINI_API_KEY`, `GEMINI_BASE_URL`, `GEMINI_MODEL`
    /// - `KV_REST_API_URL`, `KV_REST_API_TOKEN`
    /// - `ROUTER_GROQ_RPM`, `ROUTER_GEMINI_RPM`, `ROUTER_INGRESS_RPM`
    /// - `ROUTER_HTTP_TIMEOUT_SECS`, `ROUTER_PROXY_URL`
    pub fn apply_env(&mut self) -> Result<()> {
        Self::overlay_provider(&mut self.groq, "GROQ");
        Self::overlay_provider(&mut self.gemini, "GEMINI");

        if let (Ok(url), Ok(token)) = (env::var("KV_REST_API_URL"), env::var("KV_REST_API_TOKEN")) {
            self.store = Some(StoreSettings { url, token });
        }

        if let Some(v) = parse_env("ROUTER_GROQ_RPM")? {
            self.limits.groq_per_minute = Some(v);
        }
        if let Some(v) = parse_env("ROUTER_GEMINI_RPM")? {
            self.limits.gemini_per_minute = Some(v);
        }
        if let Some(v) = parse_env("ROUTER_INGRESS_RPM")? {
            self.limits.ingress_per_minute = Some(v);
        }
        if let Some(v) = parse_env("ROUTER_HTTP_TIMEOUT_SECS")? {
            self.http.timeout_secs = Some(v);
        }
        if let Ok(proxy) = env::var("ROUTER_PROXY_URL") {
            self.http.proxy_url = Some(proxy);
        }
        Ok(())
    }

    fn overlay_provider(settings: &mut ProviderSettings, prefix: &str) {
        if let Ok(key) = env::var(format!("{}_API_KEY", prefix)) {
            settings.api_key = key;
        }
        if let Ok(url) = env::var(format!("{}_BASE_URL", prefix)) {
            settings.base_url = Some(url);
        }
        if let Ok(model) = env::var(format!("{}_MODEL", prefix)) {
            settings.model = Some(model);
        }
    }

    /// Reject configurations that could never serve a request.
    pub fn validate(&self) -> Result<()> {
        for (name, provider) in [("groq", &self.groq), ("gemini", &self.gemini)] {
            if provider.api_key.trim().is_empty() {
                return Err(Error::configuration_with_context(
                    "missing API key",
                    ErrorContext::new().with_field_path(format!("{}.api_key", name)),
                ));
            }
            if let Some(ref url) = provider.base_url {
                check_url(url, &format!("{}.base_url", name))?;
            }
        }
        if let Some(ref store) = self.store {
            check_url(&store.url, "store.url")?;
        }
        if let Some(ref proxy) = self.http.proxy_url {
            check_url(proxy, "http.proxy_url")?;
        }
        Ok(())
    }
}

fn parse_env(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            Error::configuration_with_context(
                format!("expected an unsigned integer, got '{}'", raw),
                ErrorContext::new().with_field_path(name),
            )
        }),
        Err(_) => Ok(None),
    }
}

fn check_url(raw: &str, field: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL: {}", e),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(raw.to_string()),
        )
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::configuration_with_context(
            format!("unsupported URL scheme '{}'", other),
            ErrorContext::new().with_field_path(field),
        )),
    }
}
