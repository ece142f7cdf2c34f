use super::{
    function_tools, FinalAnswer, LLMError, LLMProvider, LLMResponse, Message, MessageRole,
    ToolCall, ToolCallBatch,
};
use crate::config::OpenAIConfig;
use crate::secrets::SecretCache;
use async_trait::async_trait;
use sdk::types::ToolSpec;
use serde_json::{json, Value};
use std::sync::Arc;

/// Secret key under which the API key is looked up
pub const OPENAI_API_KEY: &str = "openai_api_key";

pub struct OpenAIProvider {
    config: OpenAIConfig,
    secret_cache: Arc<SecretCache>,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig, secret_cache: Arc<SecretCache>) -> Self {
        Self {
            config,
            secret_cache,
            client: reqwest::Client::new(),
        }
    }

    /// Convert the transcript to the chat completions message format
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::Assistant if !msg.tool_calls.is_empty() => json!({
                    "role": "assistant",
                    "content": msg.content,
                    "tool_calls": msg.tool_calls.iter().map(|call| json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments,
                        }
                    })).collect::<Vec<_>>(),
                }),
                MessageRole::Tool => json!({
                    "role": "tool",
                    "tool_call_id": msg.tool_call_id,
                    "name": msg.name,
                    "content": msg.content,
                }),
                _ => json!({
                    "role": msg.role.to_string(),
                    "content": msg.content,
                }),
            })
            .collect()
    }

    /// Interpret `choices[0].message` of a completion
    fn parse_message(message: &Value) -> super::Result<LLMResponse> {
        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default();

        let raw_calls = message
            .get("tool_calls")
            .and_then(|c| c.as_array())
            .filter(|calls| !calls.is_empty());

        let Some(raw_calls) = raw_calls else {
            return Ok(LLMResponse::FinalAnswer(FinalAnswer::new(content)));
        };

        let mut calls = Vec::with_capacity(raw_calls.len());
        for raw in raw_calls {
            let id = raw
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LLMError::ParseError("Tool call without id".to_string()))?;
            let function = raw
                .get("function")
                .ok_or_else(|| LLMError::ParseError("Tool call without function".to_string()))?;
            let name = function
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LLMError::ParseError("Tool call without name".to_string()))?;
            let arguments = match function.get("arguments") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "{}".to_string(),
                Some(other) => other.to_string(),
            };
            calls.push(ToolCall::new(id, name, arguments));
        }

        Ok(LLMResponse::ToolCalls(ToolCallBatch::new(content, calls)))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        self.secret_cache.get_secret(OPENAI_API_KEY).is_ok()
    }

    async fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> super::Result<LLMResponse> {
        let api_key = self
            .secret_cache
            .get_secret(OPENAI_API_KEY)
            .map_err(|e| LLMError::AuthenticationFailed(e.to_string()))?;

        let url = format!("{}/chat/completions", self.config.base_url);

        let mut payload = json!({
            "model": self.config.model,
            "messages": Self::convert_messages(messages),
            "temperature": self.config.temperature,
        });
        if !tools.is_empty() {
            payload["tools"] = json!(function_tools(tools));
            payload["tool_choice"] = json!("auto");
        }

        tracing::debug!(
            "OpenAI request: model={}, messages={}, tools={}",
            self.config.model,
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LLMError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LLMError::RateLimitExceeded);
            } else {
                return Err(LLMError::InvalidRequest(text));
            }
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let message = choice
            .get("message")
            .ok_or_else(|| LLMError::ParseError("No message in choice".to_string()))?;

        Self::parse_message(message)
    }
}
