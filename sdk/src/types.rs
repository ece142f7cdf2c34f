//! Tool input/output types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declaration of a tool as advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object
    pub parameters: Value,
}

impl ToolSpec {
    /// Create a new ToolSpec
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Input to a tool function: the tool name and its argument object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub name: String,
    pub params: Map<String, Value>,
}

impl ToolInput {
    /// Create a new ToolInput with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    /// Parse a ToolInput from the raw JSON argument string sent by a model.
    ///
    /// An empty string is treated as `{}`. Anything other than a JSON object
    /// is rejected.
    pub fn from_json(name: impl Into<String>, arguments: &str) -> Result<Self, ToolError> {
        let trimmed = arguments.trim();
        let value: Value = if trimmed.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(trimmed)
                .map_err(|e| ToolError::InvalidArguments(format!("arguments are not JSON: {}", e)))?
        };

        match value {
            Value::Object(params) => Ok(Self {
                name: name.into(),
                params,
            }),
            Value::Null => Ok(Self::new(name)),
            other => Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    pub fn param_str(&self, key: &str) -> Result<String, ToolError> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))
    }

    /// Get an optional string parameter
    pub fn param_str_opt(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// Deserialize the whole argument object into a typed argument struct.
    ///
    /// Any mismatch (a missing required field, a wrong type, a malformed
    /// value) is an `InvalidArguments` carrying serde's own message, which
    /// names the offending field.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.params.clone()))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }
}

/// Outcome status carried by every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Ok,
    Error,
}

/// Output from a tool function: the uniform result envelope
///
/// Serializes as a flat JSON object: `{"status": "ok", ...payload}` or
/// `{"status": "error", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub status: ToolStatus,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ToolOutput {
    /// Create a successful output from a payload that serializes to an object.
    ///
    /// A payload that is not an object is placed under a `result` key.
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        let body = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
            Err(e) => return Self::error(format!("failed to encode tool result: {}", e)),
        };

        Self {
            status: ToolStatus::Ok,
            body,
        }
    }

    /// Create an error output
    pub fn error(message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::String(message.into()));
        Self {
            status: ToolStatus::Error,
            body,
        }
    }

    /// Returns true when the status is `ok`
    pub fn is_ok(&self) -> bool {
        self.status == ToolStatus::Ok
    }

    /// Human-readable message, present on every error envelope
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(|v| v.as_str())
    }

    /// Payload field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Serialize to a compact JSON string, keeping non-ASCII text verbatim
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| encode_failure(&format!("failed to encode tool result: {}", e)))
    }
}

/// Error envelope built from a value tree, so any text in `message` is escaped
fn encode_failure(message: &str) -> String {
    serde_json::json!({"status": "error", "message": message}).to_string()
}

/// Tool error types
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
