//! # llm-task-router
//!
//! 按任务类型在多个 LLM 供应商之间路由请求，提供缓存旁路、共享限流与单跳故障转移。
//!
//! Task-aware routing between two interchangeable LLM providers, with a
//! cache-aside layer and shared rate limits in front of them.
//!
//! ## Overview
//!
//! Callers hand the router a task, a cache key, a prompt, a TTL and a parser.
//! The router answers from the shared store when it can. Otherwise it picks the
//! task's primary provider, checks that provider's per-minute budget, calls it,
//! and falls back once to the other provider when the primary is over budget,
//! failing, or returns something unusable.
//!
//! - **Fail-open store**: an unreachable store turns cache reads into misses and
//!   rate-limit checks into "allowed"; it never fails a request.
//! - **Single-hop failover**: at most two provider calls per request.
//! - **Streaming**: chat answers are streamed as plain text bytes, decoded
//!   incrementally from the provider's SSE framing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_task_router::{cache::key, config::RouterConfig, tasks, Task, TaskRouter};
//!
//! #[tokio::main]
//! async fn main() -> llm_task_router::Result<()> {
//!     let router = TaskRouter::from_config(&RouterConfig::from_env()?)?;
//!
//!     let result = router
//!         .call_cached(
//!             Task::Analyze,
//!             &key::analyze("slug-1"),
//!             &tasks::analysis_prompt("Title", "Body"),
//!             tasks::ANALYSIS_TTL,
//!             tasks::parse_analysis,
//!         )
//!         .await?;
//!     println!("{} (cached: {})", result.data.summary, result.cached);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`router`] | Cached and streaming entry points, failover, builder |
//! | [`routing`] | Tasks and the static primary/fallback table |
//! | [`drivers`] | Provider adapters (Groq, Gemini) |
//! | [`cache`] | Key-value store contract, backends, cache manager, key helpers |
//! | [`resilience`] | Fixed-window rate limiting on the shared store |
//! | [`pipeline`] | SSE decoding into text streams |
//! | [`structured`] | JSON extraction from model replies |
//! | [`tasks`] | Typed payloads, prompts and parsers for built-in tasks |
//! | [`config`] | YAML / environment configuration |
//! | [`transport`] | Shared HTTP transport |

pub mod cache;
pub mod config;
pub mod drivers;
pub mod pipeline;
pub mod resilience;
pub mod router;
pub mod routing;
pub mod structured;
pub mod tasks;
pub mod transport;

// Re-export main types for convenience
pub use drivers::{CallOptions, ProviderAdapter, ProviderId};
pub use router::{RouterResult, StreamResult, TaskRouter, TaskRouterBuilder};
pub use routing::{Route, RoutingTable, Task};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
