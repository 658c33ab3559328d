//! Task router: cache-aside reads, per-provider budgets and single-hop failover.
//!
//! Implementation is split into submodules under `src/router/`.

pub mod builder;
mod cached;
mod core;
mod failover;
mod stream;

pub use builder::TaskRouterBuilder;
pub use self::core::{RouterResult, StreamResult, TaskRouter};
