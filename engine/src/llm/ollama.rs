//! Ollama LLM Provider
//!
//! This module implements the LLMProvider trait for Ollama, a local LLM provider.
//! Ollama runs models locally on the user's machine, typically at http://localhost:11434.
//!
//! Key features:
//! - Local execution (no API keys required)
//! - Native tool calling through the `tools` field of `/api/chat`
//! - Ollama does not assign tool call ids, so ids are generated here

use async_trait::async_trait;
use reqwest::Client;
use sdk::types::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{
    function_tools, FinalAnswer, LLMError, LLMProvider, LLMResponse, Message, MessageRole, Result,
    ToolCall, ToolCallBatch,
};

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Model name to use (e.g., "llama3.1:8b")
    model: String,

    /// HTTP client for API requests
    client: Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Arguments
    /// * `base_url` - Base URL for Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name to use (e.g., "llama3.1:8b")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Convert our Message format to Ollama's format
    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
                tool_calls: msg
                    .tool_calls
                    .iter()
                    .map(|call| OllamaToolCall {
                        id: Some(call.id.clone()),
                        function: OllamaFunction {
                            name: call.name.clone(),
                            // Ollama expects an argument object, not a string
                            arguments: serde_json::from_str(&call.arguments)
                                .unwrap_or_else(|_| Value::Object(Default::default())),
                        },
                    })
                    .collect(),
                tool_name: match msg.role {
                    MessageRole::Tool => msg.name.clone(),
                    _ => None,
                },
            })
            .collect()
    }

    fn into_response(message: OllamaMessage) -> LLMResponse {
        if message.tool_calls.is_empty() {
            return LLMResponse::FinalAnswer(FinalAnswer::new(message.content));
        }

        let calls = message
            .tool_calls
            .into_iter()
            .map(|call| {
                let id = call
                    .id
                    .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4()));
                let arguments = match call.function.arguments {
                    Value::String(s) => s,
                    Value::Null => "{}".to_string(),
                    other => other.to_string(),
                };
                ToolCall::new(id, call.function.name, arguments)
            })
            .collect();

        LLMResponse::ToolCalls(ToolCallBatch::new(message.content, calls))
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse> {
        let ollama_messages = self.convert_messages(messages);

        tracing::debug!(
            "Ollama request: model={}, messages={}, total_chars={}",
            self.model,
            ollama_messages.len(),
            ollama_messages
                .iter()
                .map(|m| m.content.len())
                .sum::<usize>()
        );

        let request = OllamaRequest {
            model: self.model.clone(),
            messages: ollama_messages,
            tools: function_tools(tools),
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        tracing::info!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ProviderUnavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(Self::into_response(ollama_response.message))
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: OllamaFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_properties() {
        let provider = OllamaProvider::new("http://localhost:11434", "llama3.1:8b");

        assert_eq!(provider.name(), "ollama");
        assert!(provider.is_local());
    }

    #[test]
    fn test_message_conversion() {
        let provider = OllamaProvider::new("http://localhost:11434", "llama3.1:8b");

        let messages = vec![
            Message::system("You are a helpful assistant"),
            Message::user("Hello"),
            Message::assistant_with_tools(
                "",
                vec![ToolCall::new("call_1", "read_memory", r#"{"topic":"work"}"#)],
            ),
            Message::tool_result(r#"{"status":"ok"}"#, "call_1", "read_memory"),
        ];

        let ollama_messages = provider.convert_messages(&messages);

        assert_eq!(ollama_messages.len(), 4);
        assert_eq!(ollama_messages[0].role, "system");
        assert_eq!(ollama_messages[1].role, "user");
        assert_eq!(ollama_messages[2].role, "assistant");
        assert_eq!(
            ollama_messages[2].tool_calls[0].function.arguments,
            serde_json::json!({"topic": "work"})
        );
        assert_eq!(ollama_messages[3].tool_name.as_deref(), Some("read_memory"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let message: OllamaMessage = serde_json::from_value(serde_json::json!({
            "role": "assistant",
            "content": "",
            "tool_calls": [
                {"function": {"name": "list_topics", "arguments": {}}},
                {"function": {"name": "get_statistics", "arguments": {}}}
            ]
        }))
        .unwrap();

        match OllamaProvider::into_response(message) {
            LLMResponse::ToolCalls(batch) => {
                assert_eq!(batch.calls.len(), 2);
                assert!(batch.calls[0].id.starts_with("call_"));
                assert_ne!(batch.calls[0].id, batch.calls[1].id);
                assert_eq!(batch.calls[0].arguments, "{}");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_plain_reply_is_final_answer() {
        let message: OllamaMessage = serde_json::from_value(serde_json::json!({
            "role": "assistant",
            "content": "Hello!"
        }))
        .unwrap();

        match OllamaProvider::into_response(message) {
            LLMResponse::FinalAnswer(answer) => assert_eq!(answer.content, "Hello!"),
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
