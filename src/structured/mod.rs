//! Structured output extraction for model replies.
//!
//! Model output is not a validated contract: replies arrive wrapped in code
//! fences, preceded by prose, or occasionally cut short. This module recovers the
//! JSON document when one is present and reports a parse error when it is not;
//! nothing is coerced.
//!
//! # Examples
//!
//! ```
//! use llm_task_router::structured::extract_json;
//! use serde_json::json;
//!
//! let raw = "```json\n{\"title\": \"X\"}\n```";
//! assert_eq!(extract_json(raw).unwrap(), json!({"title": "X"}));
//! assert!(extract_json("sorry, I can't help with that").is_err());
//! ```

pub mod extract;

pub use extract::{extract_json, parse_as};
