//! Recall Engine Library
//!
//! This library provides the core functionality of Recall: a JSON-backed
//! memory store that a chat model manipulates through tool calls.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Persistent memory store
pub mod memory;

/// Memory tools exposed to the model
pub mod tools;

/// LLM provider abstraction layer
pub mod llm;

/// Conversation loop
pub mod agent;

/// Secret management module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
