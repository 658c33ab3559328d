//! Provider adapters and the REST store against local mock servers.

use futures::StreamExt;
use llm_task_router::cache::{KvStore, RestKvStore};
use llm_task_router::config::ProviderSettings;
use llm_task_router::drivers::{GeminiAdapter, GroqAdapter};
use llm_task_router::transport::HttpOptions;
use llm_task_router::{CallOptions, Error, ProviderAdapter, ProviderId};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::time::Duration;

fn groq_for(server: &ServerGuard) -> GroqAdapter {
    let settings = ProviderSettings::new("gsk-test")
        .with_base_url(server.url())
        .with_model("test-model");
    GroqAdapter::new(&settings, &HttpOptions::default()).unwrap()
}

fn gemini_for(server: &ServerGuard) -> GeminiAdapter {
    let settings = ProviderSettings::new("AIza-test")
        .with_base_url(server.url())
        .with_model("gemini-test");
    GeminiAdapter::new(&settings, &HttpOptions::default()).unwrap()
}

async fn collect(adapter: &dyn ProviderAdapter, options: &CallOptions) -> String {
    let mut stream = adapter.call_stream("hi", options).await.unwrap();
    let mut out = String::new();
    while let Some(chunk) = stream.next().await {
        out.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
    }
    out
}

#[tokio::test]
async fn test_groq_call_sends_openai_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer gsk-test")
        .match_header("x-router-request-id", Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 2048,
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
        .create_async()
        .await;

    let text = groq_for(&server)
        .call("hi", &CallOptions::batch())
        .await
        .unwrap();

    assert_eq!(text, "hello");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_groq_error_status_becomes_provider_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"rate limit reached"}}"#)
        .create_async()
        .await;

    let err = groq_for(&server)
        .call("hi", &CallOptions::batch())
        .await
        .unwrap_err();

    match err {
        Error::Provider {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, ProviderId::Groq);
            assert_eq!(status, Some(429));
            assert!(message.contains("rate limit reached"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_groq_empty_completion_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":""}}]}"#)
        .create_async()
        .await;

    let err = groq_for(&server)
        .call("hi", &CallOptions::batch())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider { status: None, .. }));
}

#[tokio::test]
async fn test_groq_stream_decodes_deltas() {
    let mut server = Server::new_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"stream": true, "temperature": 0.7})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let adapter = groq_for(&server);
    assert_eq!(collect(&adapter, &CallOptions::chat()).await, "Hello");
}

#[tokio::test]
async fn test_groq_stream_open_failure_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let result = groq_for(&server)
        .call_stream("hi", &CallOptions::chat())
        .await;
    assert!(matches!(
        result,
        Err(Error::Provider {
            status: Some(503),
            ..
        })
    ));
}

#[tokio::test]
async fn test_gemini_call_joins_parts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-test:generateContent")
        .match_header("x-goog-api-key", "AIza-test")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "generationConfig": {"maxOutputTokens": 2048}
        })))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"{\"title\":"},{"text":"\"X\"}"}]}}]}"#)
        .create_async()
        .await;

    let text = gemini_for(&server)
        .call("hi", &CallOptions::batch())
        .await
        .unwrap();

    assert_eq!(text, r#"{"title":"X"}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_blocked_prompt_reports_reason() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/models/gemini-test:generateContent")
        .with_status(200)
        .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let err = gemini_for(&server)
        .call("hi", &CallOptions::batch())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn test_gemini_stream_uses_sse_endpoint() {
    let mut server = Server::new_async().await;
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Sela\"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"mat\"}]}}]}\r\n\r\n",
    );
    server
        .mock("POST", "/models/gemini-test:streamGenerateContent")
        .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let adapter = gemini_for(&server);
    assert_eq!(collect(&adapter, &CallOptions::chat()).await, "Selamat");
}

#[tokio::test]
async fn test_rest_store_commands() {
    let mut server = Server::new_async().await;
    let incr = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer kv-token")
        .match_body(Matcher::Json(json!(["INCR", "ratelimit:groq:1"])))
        .with_status(200)
        .with_body(r#"{"result":1}"#)
        .create_async()
        .await;
    let expire = server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!(["EXPIRE", "ratelimit:groq:1", 65])))
        .with_status(200)
        .with_body(r#"{"result":1}"#)
        .create_async()
        .await;
    let set = server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!([
            "SET",
            "t:slug-1:ms",
            "{\"title\":\"X\"}",
            "EX",
            2592000
        ])))
        .with_status(200)
        .with_body(r#"{"result":"OK"}"#)
        .create_async()
        .await;
    let get = server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!(["GET", "t:slug-1:ms"])))
        .with_status(200)
        .with_body(r#"{"result":"{\"title\":\"X\"}"}"#)
        .create_async()
        .await;

    let store = RestKvStore::new(server.url(), "kv-token").unwrap();
    assert_eq!(store.incr("ratelimit:groq:1").await.unwrap(), 1);
    assert!(store
        .expire("ratelimit:groq:1", Duration::from_secs(65))
        .await
        .unwrap());
    store
        .set("t:slug-1:ms", &json!({"title": "X"}), Duration::from_secs(2_592_000))
        .await
        .unwrap();
    assert_eq!(
        store.get("t:slug-1:ms").await.unwrap(),
        Some(json!({"title": "X"}))
    );

    incr.assert_async().await;
    expire.assert_async().await;
    set.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_rest_store_missing_key_and_errors() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!(["GET", "a:none"])))
        .with_status(200)
        .with_body(r#"{"result":null}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!(["INCR", "bad"])))
        .with_status(400)
        .with_body(r#"{"error":"WRONGTYPE Operation against a key holding the wrong kind of value"}"#)
        .create_async()
        .await;

    let store = RestKvStore::new(server.url(), "kv-token").unwrap();
    assert_eq!(store.get("a:none").await.unwrap(), None);
    let err = store.incr("bad").await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert!(err.to_string().contains("WRONGTYPE"));
}
