use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Characters of the offending reply kept in a parse error.
const SNIPPET_CHARS: usize = 120;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[A-Za-z0-9_-]*[ \t]*\n?([\s\S]*?)\s*```").expect("valid code fence regex")
});

/// Parse the JSON document in a model reply.
///
/// Tried in order:
/// - the reply as-is
/// - the body of the first fenced block (```` ```json ```` or ```` ``` ````)
/// - the outermost `{...}` or `[...]` span
pub fn extract_json(raw: &str) -> Result<Value> {
    let text = raw.trim();

    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Ok(v);
    }

    if let Some(inner) = CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        if let Ok(v) = serde_json::from_str::<Value>(inner.as_str().trim()) {
            return Ok(v);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(span) = outermost_span(text, open, close) {
            if let Ok(v) = serde_json::from_str::<Value>(span) {
                return Ok(v);
            }
        }
    }

    Err(Error::parse_with_context(
        "reply does not contain a JSON document",
        ErrorContext::new()
            .with_source("extract_json")
            .with_details(snippet(text)),
    ))
}

/// [`extract_json`] followed by deserialization into `T`.
pub fn parse_as<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(|e| {
        Error::parse_with_context(
            format!("unexpected reply shape: {}", e),
            ErrorContext::new()
                .with_source("parse_as")
                .with_details(snippet(raw.trim())),
        )
    })
}

/// Text from the first `open` to the last `close`, inclusive.
fn outermost_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn snippet(text: &str) -> String {
    let mut s: String = text.chars().take(SNIPPET_CHARS).collect();
    if text.chars().count() > SNIPPET_CHARS {
        s.push('…');
    }
    s
}
