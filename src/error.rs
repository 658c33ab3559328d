use crate::cache::StoreError;
use crate::drivers::ProviderId;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "groq.base_url", "$.title")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., a snippet of the offending payload)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "extract_json")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the task router.
///
/// Only a subset of these ever reach callers of [`crate::TaskRouter`]: store
/// failures are absorbed (miss / allow), and a primary provider failure is
/// absorbed by failover.
#[derive(Debug, Error)]
pub enum Error {
    /// Both the primary and the fallback provider are over budget.
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Provider error ({provider}){}: {message}", format_status(.status))]
    Provider {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
    },

    #[error("Response parse error: {message}{}", format_context(.context))]
    Parse {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" HTTP {}", s),
        None => String::new(),
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn provider(provider: ProviderId, status: Option<u16>, msg: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            status,
            message: msg.into(),
        }
    }

    /// Create a new parse error with structured context
    pub fn parse_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Parse {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Parse { context, .. } | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Response-shape failures, as opposed to the provider being unreachable.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Serialization(_))
    }

    /// Retry hint for a throttling response, if this is a rate-limit condition.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Error::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// HTTP status a hosting layer should answer with.
    ///
    /// Rate limiting maps to 429, an unrecovered provider failure to 503.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RateLimited { .. } => 429,
            Error::Provider { .. }
            | Error::Parse { .. }
            | Error::Transport(_)
            | Error::Store(_)
            | Error::Serialization(_) => 503,
            Error::Configuration { .. } | Error::Io(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_maps_to_429_with_hint() {
        let err = Error::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.retry_after_secs(), Some(30));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_provider_failure_maps_to_503() {
        let err = Error::provider(ProviderId::Gemini, Some(500), "boom");
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.retry_after_secs(), None);
        assert_eq!(err.to_string(), "Provider error (gemini) HTTP 500: boom");
    }

    #[test]
    fn test_parse_error_display_includes_context() {
        let err = Error::parse_with_context(
            "not json",
            ErrorContext::new().with_source("extract_json"),
        );
        assert!(err.is_parse());
        assert_eq!(
            err.to_string(),
            "Response parse error: not json (source: extract_json)"
        );
    }
}
