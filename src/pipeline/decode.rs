//! Streaming decoders (Bytes -> JSON Value -> text Bytes)

use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::debug;

/// A minimal SSE decoder:
/// - buffers raw bytes and splits frames on a blank line (CRLF tolerated)
/// - joins the `data:` lines of each frame into one payload
/// - stops on `done_signal` (default "[DONE]")
/// - skips frames whose payload is not JSON
#[derive(Debug, Clone)]
pub struct SseDecoder {
    done_signal: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            done_signal: "[DONE]".to_string(),
        }
    }

    pub fn with_done_signal(mut self, signal: impl Into<String>) -> Self {
        self.done_signal = signal.into();
        self
    }

    /// Extract the payload of one frame. `None` for comments, empty frames and
    /// frames without data lines.
    fn frame_payload(frame: &str) -> Option<String> {
        let mut data_lines = Vec::new();
        let mut saw_field = false;
        for line in frame.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
                saw_field = true;
            } else if line.starts_with("event:") || line.starts_with("id:") || line.starts_with("retry:") {
                saw_field = true;
            } else if !saw_field {
                // Bare JSON line without an SSE field name.
                data_lines.push(line);
            }
        }
        if data_lines.is_empty() {
            None
        } else {
            Some(data_lines.join("\n"))
        }
    }

    /// Decode a raw SSE byte stream into JSON frames.
    pub fn decode(&self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
        let done_signal = self.done_signal.clone();

        let stream = stream::unfold(
            (input, Vec::<u8>::new(), false),
            move |(mut input, mut buf, finished)| {
                let done_signal = done_signal.clone();
                async move {
                    if finished {
                        return None;
                    }
                    loop {
                        if let Some(idx) = find_frame_end(&buf) {
                            let frame_bytes: Vec<u8> = buf.drain(..idx + 2).collect();
                            let frame = String::from_utf8_lossy(&frame_bytes[..idx]).to_string();
                            match Self::frame_payload(&frame) {
                                Some(payload) if payload.trim() == done_signal => return None,
                                Some(payload) => match serde_json::from_str::<Value>(&payload) {
                                    Ok(v) => return Some((Ok(v), (input, buf, false))),
                                    Err(e) => {
                                        debug!(error = %e, "skipping malformed stream frame");
                                        continue;
                                    }
                                },
                                None => continue,
                            }
                        }

                        match input.next().await {
                            Some(Ok(bytes)) => {
                                // Multi-byte characters may straddle chunks; decode per frame only.
                                buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                                continue;
                            }
                            Some(Err(e)) => return Some((Err(e), (input, buf, true))),
                            None => {
                                let frame = String::from_utf8_lossy(&buf).to_string();
                                let payload = Self::frame_payload(&frame)?;
                                if payload.trim() == done_signal {
                                    return None;
                                }
                                return serde_json::from_str::<Value>(&payload)
                                    .ok()
                                    .map(|v| (Ok(v), (input, Vec::new(), true)));
                            }
                        }
                    }
                }
            },
        );

        Box::pin(stream)
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn find_frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

/// Map decoded frames to text deltas, dropping frames that carry no text.
pub fn text_deltas<F>(frames: BoxStream<'static, Value>, extract: F) -> BoxStream<'static, Bytes>
where
    F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
{
    let stream = frames.filter_map(move |item| {
        let out = match item {
            Ok(frame) => extract(&frame)
                .filter(|text| !text.is_empty())
                .map(|text| Ok(Bytes::from(text))),
            Err(e) => Some(Err(e)),
        };
        futures::future::ready(out)
    });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn chunks(parts: Vec<&'static [u8]>) -> BoxStream<'static, Bytes> {
        Box::pin(stream::iter(
            parts.into_iter().map(|p| Ok(Bytes::from_static(p))),
        ))
    }

    macro_rules! raw {
        ($($part:expr),* $(,)?) => {
            chunks(vec![$(&$part[..]),*])
        };
    }

    async fn collect(input: BoxStream<'static, Bytes>) -> Vec<Value> {
        SseDecoder::new().decode(input).try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn test_decodes_frames_across_chunks() {
        let frames = collect(raw![
            b"data: {\"a\":",
            b"1}\n\ndata: {\"a\":2}\n",
            b"\ndata: [DONE]\n\n",
        ])
        .await;
        assert_eq!(frames, vec![serde_json::json!({"a":1}), serde_json::json!({"a":2})]);
    }

    #[tokio::test]
    async fn test_skips_malformed_and_comment_frames() {
        let frames = collect(raw![
            b": keep-alive\n\ndata: {broken\n\ndata: {\"ok\":true}\n\n",
        ])
        .await;
        assert_eq!(frames, vec![serde_json::json!({"ok": true})]);
    }

    #[tokio::test]
    async fn test_crlf_and_event_lines() {
        let frames = collect(raw![
            b"event: delta\r\ndata: {\"n\":1}\r\n\r\n",
        ])
        .await;
        assert_eq!(frames, vec![serde_json::json!({"n": 1})]);
    }

    #[tokio::test]
    async fn test_trailing_frame_without_delimiter() {
        let frames = collect(raw![b"data: {\"n\":1}"]).await;
        assert_eq!(frames, vec![serde_json::json!({"n": 1})]);
    }

    #[tokio::test]
    async fn test_multibyte_split_between_chunks() {
        // "é" is 0xC3 0xA9
        let frames = collect(raw![b"data: {\"t\":\"caf\xC3", b"\xA9\"}\n\n"]).await;
        assert_eq!(frames, vec![serde_json::json!({"t": "café"})]);
    }

    #[tokio::test]
    async fn test_text_deltas_drop_empty() {
        let frames: BoxStream<'static, Value> = Box::pin(stream::iter(vec![
            Ok(serde_json::json!({"t": "Hel"})),
            Ok(serde_json::json!({"t": ""})),
            Ok(serde_json::json!({"x": 1})),
            Ok(serde_json::json!({"t": "lo"})),
        ]));
        let out: Vec<Bytes> = text_deltas(frames, |v| v["t"].as_str().map(String::from))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(out, vec![Bytes::from("Hel"), Bytes::from("lo")]);
    }
}
