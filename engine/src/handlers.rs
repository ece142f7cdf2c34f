//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - chat: interactive session with the memory butler
//! - ask: a single turn
//! - topics, stats, show, search, forget: direct store access through the
//!   same tool dispatcher the model uses

use anyhow::{Context, Result};
use sdk::errors::RecallErrorExt;
use sdk::types::{ToolInput, ToolOutput};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::agent::{Conversation, ConversationSettings, TurnOutcome, TurnReply};
use crate::config::Config;
use crate::llm::ollama::OllamaProvider;
use crate::llm::openai::{OpenAIProvider, OPENAI_API_KEY};
use crate::llm::LLMProvider;
use crate::memory::{MemoryItem, MemoryStatistics, MemoryStore, TopicDigest, TopicOverview};
use crate::secrets::{SecretCache, SecretManager};
use crate::tools::{MemoryTool, ToolDispatcher};

/// Keychain service name for stored API keys
pub const KEYRING_SERVICE: &str = "recall";

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Open the configured store, creating an empty file if needed
pub fn open_dispatcher(config: &Config) -> Result<ToolDispatcher> {
    let store = MemoryStore::new(config.store_path());
    store
        .ensure_exists()
        .with_context(|| format!("Failed to initialize memory store at {:?}", store.path()))?;
    Ok(ToolDispatcher::new(store))
}

/// Build the provider named by `llm.default_provider`
pub fn build_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    match config.llm.default_provider.as_str() {
        "openai" => {
            let manager = Arc::new(SecretManager::new(KEYRING_SERVICE));
            let cache = Arc::new(SecretCache::new(manager));
            // Resolve the key up front so any prompt happens before the banner
            cache
                .preload(&[OPENAI_API_KEY])
                .context("Failed to load OpenAI API key")?;
            Ok(Arc::new(OpenAIProvider::new(
                config.llm.openai.clone(),
                cache,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            config.llm.ollama.base_url.clone(),
            config.llm.ollama.model.clone(),
        ))),
        other => anyhow::bail!("Unsupported LLM provider '{}'", other),
    }
}

fn start_conversation(config: &Config) -> Result<Conversation> {
    let dispatcher = open_dispatcher(config)?;
    let provider = build_provider(config)?;
    tracing::info!(
        "Using provider '{}' with store {:?}",
        provider.name(),
        dispatcher.store().path()
    );
    Ok(Conversation::new(
        provider,
        dispatcher,
        ConversationSettings::from_config(&config.agent),
    ))
}

/// Run the interactive chat loop
///
/// Exit commands, end of input and Ctrl-C all end the session with the
/// closing message. A Ctrl-C during a model call abandons that turn.
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let mut conversation = start_conversation(config)?;
    let name = config.agent.assistant_name.as_str();

    if format == OutputFormat::Text {
        println!("{} memory butler v{}", name, env!("CARGO_PKG_VERSION"));
        println!(
            "(type {} or press Ctrl-C to end the conversation)",
            config.agent.exit_commands.join(" / ")
        );
        println!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if format == OutputFormat::Text {
            stdout.write_all(b"you: ").await?;
            stdout.flush().await?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            let farewell = conversation.close();
            print_farewell(name, &farewell, format)?;
            return Ok(());
        };

        let outcome = tokio::select! {
            outcome = conversation.handle_input(&line) => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(outcome) = outcome else {
            let farewell = conversation.close();
            print_farewell(name, &farewell, format)?;
            return Ok(());
        };

        match outcome {
            Ok(TurnOutcome::Reply(reply)) => print_reply(name, &reply, format)?,
            Ok(TurnOutcome::Skipped) => {}
            Ok(TurnOutcome::Exit(farewell)) => {
                print_farewell(name, &farewell, format)?;
                return Ok(());
            }
            Err(e) if e.is_recoverable() => print_turn_error(&e, format)?,
            Err(e) => {
                print_turn_error(&e, format)?;
                return Err(e.into());
            }
        }
    }
}

/// Run a single turn and print the answer
pub async fn handle_ask(text: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let mut conversation = start_conversation(config)?;
    let name = config.agent.assistant_name.as_str();

    match conversation.handle_input(text).await {
        Ok(TurnOutcome::Reply(reply)) => print_reply(name, &reply, format),
        Ok(TurnOutcome::Skipped) => Ok(()),
        Ok(TurnOutcome::Exit(farewell)) => print_farewell(name, &farewell, format),
        Err(e) => {
            print_turn_error(&e, format)?;
            Err(e.into())
        }
    }
}

/// Run one memory tool directly and print its envelope
pub fn handle_tool(
    tool: MemoryTool,
    input: ToolInput,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let dispatcher = open_dispatcher(config)?;
    let output = dispatcher
        .execute(tool, &input)
        .with_context(|| format!("{} failed", tool))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => println!("{}", render_text(tool, &output)?),
    }

    if output.is_ok() {
        Ok(())
    } else {
        anyhow::bail!(output.message().unwrap_or("tool failed").to_string())
    }
}

fn print_reply(name: &str, reply: &TurnReply, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}: {}", name, reply.answer);
            println!();
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "ok",
                "answer": reply.answer,
                "tool_calls": reply.tool_calls,
                "model_calls": reply.model_calls,
                "duration_ms": reply.duration_ms,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    }
    Ok(())
}

fn print_farewell(name: &str, farewell: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("\n{}: {}", name, farewell),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&json!({"status": "exit", "message": farewell}))?
        ),
    }
    Ok(())
}

fn print_turn_error(error: &sdk::errors::EngineError, format: OutputFormat) -> Result<()> {
    let message = SecretManager::new(KEYRING_SERVICE).scrub(&error.to_string());
    match format {
        OutputFormat::Text => {
            eprintln!("✗ {}", message);
            eprintln!("  Hint: {}", error.user_hint());
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&json!({
                "status": "error",
                "message": message,
                "hint": error.user_hint(),
            }))?
        ),
    }
    Ok(())
}

/// Human-readable rendering of a tool envelope
pub fn render_text(tool: MemoryTool, output: &ToolOutput) -> Result<String> {
    if !output.is_ok() {
        return Ok(format!("✗ {}", output.message().unwrap_or("unknown error")));
    }

    let field = |key: &str| output.get(key).cloned().unwrap_or(Value::Null);
    let mut lines = Vec::new();

    match tool {
        MemoryTool::ListTopics => {
            let topics: Vec<TopicOverview> = serde_json::from_value(field("topics"))?;
            if topics.is_empty() {
                lines.push("No memories yet".to_string());
            }
            for topic in topics {
                lines.push(format!(
                    "{} ({} memories, last active {})",
                    topic.topic,
                    topic.count,
                    topic
                        .latest_activity
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "never".to_string())
                ));
                if !topic.tags.is_empty() {
                    lines.push(format!("  tags: {}", topic.tags.join(", ")));
                }
            }
        }
        MemoryTool::GetStatistics => {
            let stats: MemoryStatistics = serde_json::from_value(Value::Object(
                output.body.clone(),
            ))?;
            lines.push(format!("Memories: {}", stats.total_memories));
            lines.push(format!("Topics:   {}", stats.total_topics));
            if !stats.top_tags.is_empty() {
                lines.push("Top tags:".to_string());
                for tag in stats.top_tags {
                    lines.push(format!("  {} ({})", tag.tag, tag.count));
                }
            }
        }
        MemoryTool::SummarizeTopic => {
            let digest: TopicDigest = serde_json::from_value(field("summary_data"))?;
            lines.push(format!("{} ({} memories)", digest.topic, digest.total_entries));
            for entry in digest.entries {
                lines.push(String::new());
                lines.push(format!("# {}  [{}]", entry.title, entry.created_at));
                lines.push(entry.content);
                if !entry.tags.is_empty() {
                    lines.push(format!("tags: {}", entry.tags.join(", ")));
                }
            }
        }
        MemoryTool::ReadMemory => {
            let results: Vec<MemoryItem> = serde_json::from_value(field("results"))?;
            lines.push(format!("{} result(s)", results.len()));
            for item in results {
                lines.push(String::new());
                lines.push(format!("[{}] {}", item.topic, item.title));
                lines.push(item.content);
                if !item.tags.is_empty() {
                    lines.push(format!("tags: {}", item.tags.join(", ")));
                }
            }
        }
        MemoryTool::WriteMemory | MemoryTool::UpdateMemory | MemoryTool::DeleteMemory => {
            lines.push(format!(
                "✓ {}",
                output.message().unwrap_or(tool.name())
            ));
        }
    }

    Ok(lines.join("\n"))
}
