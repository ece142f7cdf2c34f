//! Integration tests for Ollama provider
//!
//! These tests do NOT require a running Ollama instance. The chat endpoint is
//! served by a mock server.

use recall_engine::llm::{ollama::OllamaProvider, LLMError, LLMProvider, LLMResponse, Message};
use recall_engine::tools::MemoryTool;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_ollama_tool_calls_get_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3.1:8b", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "write_memory", "arguments": {"topic": "work", "title": "A", "content": "x"}}},
                    {"function": {"name": "list_topics", "arguments": {}}}
                ]
            },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    let tools = vec![MemoryTool::WriteMemory.spec(), MemoryTool::ListTopics.spec()];
    let response = provider
        .generate(&[Message::user("remember A")], &tools)
        .await
        .unwrap();

    let LLMResponse::ToolCalls(batch) = response else {
        panic!("expected tool calls");
    };
    assert_eq!(batch.calls.len(), 2);
    assert!(batch.calls[0].id.starts_with("call_"));
    assert_ne!(batch.calls[0].id, batch.calls[1].id);
    assert_eq!(batch.calls[0].name, "write_memory");

    let args: serde_json::Value = serde_json::from_str(&batch.calls[0].arguments).unwrap();
    assert_eq!(args["topic"], "work");
    assert_eq!(batch.calls[1].arguments, "{}");
}

#[tokio::test]
async fn test_ollama_final_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "Hello from llama"},
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    let response = provider.generate(&[Message::user("hi")], &[]).await.unwrap();

    match response {
        LLMResponse::FinalAnswer(answer) => assert_eq!(answer.content, "Hello from llama"),
        other => panic!("unexpected response: {:?}", other),
    }

    // No tools declared means no tools field at all
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn test_ollama_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "missing:latest");
    let err = provider
        .generate(&[Message::user("hi")], &[])
        .await
        .unwrap_err();

    match err {
        LLMError::ProviderUnavailable(msg) => assert!(msg.contains("model not found")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    let err = provider
        .generate(&[Message::user("hi")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_ollama_connection_error() {
    // Nothing listens on port 1
    let provider = OllamaProvider::new("http://127.0.0.1:1", "llama3.1:8b");
    let err = provider
        .generate(&[Message::user("Hello")], &[])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LLMError::ProviderUnavailable(_) | LLMError::NetworkError(_)
    ));
}
