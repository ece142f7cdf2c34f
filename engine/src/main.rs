// Recall memory butler
// Main entry point for the recall binary

use anyhow::Context;
use clap::Parser;
use recall_engine::cli::{Cli, Command};
use recall_engine::config::Config;
use recall_engine::handlers::{handle_ask, handle_chat, handle_tool, OutputFormat};
use recall_engine::telemetry::init_telemetry_with_level;
use recall_engine::tools::MemoryTool;
use sdk::types::ToolInput;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = match &cli.config {
        Some(config_path) => Config::load_or_create_at(config_path),
        None => Config::load_or_create(),
    }
    .context("Failed to load configuration")?;

    // --log wins over the config file; RUST_LOG wins over both
    init_telemetry_with_level(cli.log.as_deref().unwrap_or(&config.core.log_level));

    tracing::info!(
        "Recall v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command() {
        Command::Chat => handle_chat(&config, format).await,

        Command::Ask { text } => {
            tracing::info!("Single turn");
            handle_ask(text, &config, format).await
        }

        Command::Topics => handle_tool(
            MemoryTool::ListTopics,
            ToolInput::new(MemoryTool::ListTopics.name()),
            &config,
            format,
        ),

        Command::Stats => handle_tool(
            MemoryTool::GetStatistics,
            ToolInput::new(MemoryTool::GetStatistics.name()),
            &config,
            format,
        ),

        Command::Show { topic } => handle_tool(
            MemoryTool::SummarizeTopic,
            ToolInput::new(MemoryTool::SummarizeTopic.name()).with_param("topic", json!(topic)),
            &config,
            format,
        ),

        Command::Search {
            topic,
            title,
            query,
            tags,
        } => {
            let mut input = ToolInput::new(MemoryTool::ReadMemory.name());
            if let Some(topic) = topic {
                input = input.with_param("topic", json!(topic));
            }
            if let Some(title) = title {
                input = input.with_param("title", json!(title));
            }
            if let Some(query) = query {
                input = input.with_param("query", json!(query));
            }
            if !tags.is_empty() {
                input = input.with_param("tags", json!(tags));
            }
            handle_tool(MemoryTool::ReadMemory, input, &config, format)
        }

        Command::Forget { topic, title } => {
            let mut input =
                ToolInput::new(MemoryTool::DeleteMemory.name()).with_param("topic", json!(topic));
            if let Some(title) = title {
                input = input.with_param("title", json!(title));
            }
            tracing::info!("Forgetting from topic '{}'", topic);
            handle_tool(MemoryTool::DeleteMemory, input, &config, format)
        }
    }
}
