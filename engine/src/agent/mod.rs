//! Conversation loop
//!
//! The orchestrator that turns a user utterance into model calls and
//! memory tool executions, keeping an append-only transcript.

pub mod core;
pub mod prompt;
pub mod transcript;

pub use core::{Conversation, ConversationSettings, SessionState, TurnOutcome, TurnReply};
pub use transcript::Transcript;
