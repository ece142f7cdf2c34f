//! Error types and handling
//!
//! This module provides the error types used throughout the Recall engine.
//! All errors implement the `RecallErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Recoverability
//!
//! Store-level "not found" errors and tool input errors are recoverable: the
//! dispatcher turns them into error envelopes that the model sees as a tool
//! result. Store I/O, store corruption and model endpoint failures are not
//! recoverable and end the session.

use thiserror::Error;

/// Trait for Recall error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait RecallErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, file paths or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors leave the session usable. Non-recoverable errors
    /// terminate the conversation.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Memory store**: missing topic/title, unreadable or corrupt store file
/// - **Tool dispatch**: unknown tool, invalid arguments
/// - **Conversation**: tool loop circuit breaker, model timeouts
/// - **Configuration / secrets / LLM provider**: ambient failures
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, RecallErrorExt};
///
/// let error = EngineError::TopicMissing("work".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::StoreCorrupt("root is not an object".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Memory store errors
    #[error("topic '{0}' does not exist")]
    TopicMissing(String),

    #[error("no memory titled '{title}' in topic '{topic}'")]
    TitleMissing { topic: String, title: String },

    #[error("Memory store I/O error: {0}")]
    StoreIo(String),

    #[error("Memory store is corrupt: {0}")]
    StoreCorrupt(String),

    // Tool errors
    #[error("unknown tool {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    Validation { tool: String, reason: String },

    // Conversation loop errors
    #[error("Tool loop exceeded {limit} rounds in a single turn")]
    ToolLoopExceeded { limit: usize },

    #[error("LLM call timed out")]
    LLMTimeout,

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for the "not found" class raised by update/delete/summarize.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TopicMissing(_) | Self::TitleMissing { .. })
    }
}

impl RecallErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::TopicMissing(_) => "That topic has no memories yet",
            Self::TitleMissing { .. } => "No memory with that title exists in the topic",
            Self::StoreIo(_) => "The memory file could not be read or written. Check permissions",
            Self::StoreCorrupt(_) => {
                "The memory file is damaged. Fix or move it aside and restart"
            }

            Self::UnknownTool(_) => "The requested tool is not available",
            Self::Validation { .. } => "The tool was called with invalid arguments",

            Self::ToolLoopExceeded { .. } => {
                "The assistant kept calling tools without answering. Try rephrasing"
            }
            Self::LLMTimeout => "LLM provider took too long to respond. Try again",
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",

            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_)
            | Self::StoreIo(_)
            | Self::StoreCorrupt(_)
            | Self::LLMTimeout
            | Self::LLMProvider(_)
            | Self::KeyringError(_)
            | Self::Io(_) => false,

            // All other errors leave the session usable
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages_are_distinct() {
        let topic = EngineError::TopicMissing("work".to_string());
        let title = EngineError::TitleMissing {
            topic: "work".to_string(),
            title: "standup".to_string(),
        };

        assert_eq!(topic.to_string(), "topic 'work' does not exist");
        assert_eq!(title.to_string(), "no memory titled 'standup' in topic 'work'");
        assert!(topic.is_not_found());
        assert!(title.is_not_found());
    }

    #[test]
    fn test_unknown_tool_message() {
        let err = EngineError::UnknownTool("launch_rocket".to_string());
        assert_eq!(err.to_string(), "unknown tool launch_rocket");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fatal_errors_not_recoverable() {
        assert!(!EngineError::StoreIo("denied".to_string()).is_recoverable());
        assert!(!EngineError::StoreCorrupt("bad".to_string()).is_recoverable());
        assert!(!EngineError::LLMTimeout.is_recoverable());
        assert!(EngineError::ToolLoopExceeded { limit: 20 }.is_recoverable());
    }
}
