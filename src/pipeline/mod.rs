//! 流式处理模块：把供应商的分块事件流解码为纯文本字节流。
//!
//! # Streaming Pipeline
//!
//! ```text
//! HTTP bytes → SseDecoder → JSON frames → text_deltas(extract) → text Bytes
//! ```
//!
//! Each provider adapter supplies its own `extract` function that pulls the text
//! delta out of one frame. Frames that are not JSON, or carry no text, are skipped
//! so a single bad fragment never ends an in-progress answer.

pub mod decode;

pub use decode::{text_deltas, SseDecoder};
