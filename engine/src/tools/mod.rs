pub mod schema;

pub use schema::MemoryTool;

use sdk::errors::{EngineError, RecallErrorExt};
use sdk::types::{ToolInput, ToolOutput, ToolSpec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::memory::{MemoryItem, MemoryStore, ReadFilter, TopicDigest, TopicOverview};
use schema::{DeleteArgs, SummarizeArgs, UpdateArgs, WriteArgs};

#[derive(Serialize)]
struct Stored<'a> {
    stored: &'a MemoryItem,
}

#[derive(Serialize)]
struct Updated {
    message: &'static str,
}

#[derive(Serialize)]
struct Deleted {
    message: String,
    deleted_count: usize,
}

#[derive(Serialize)]
struct Topics<'a> {
    total_topics: usize,
    topics: &'a [TopicOverview],
}

#[derive(Serialize)]
struct Summary<'a> {
    summary_data: &'a TopicDigest,
}

/// Dispatches memory tool calls from the model to the store.
///
/// Every outcome a model can react to comes back as `Ok(envelope)`:
/// unknown tools, malformed or missing arguments, and missing topics or
/// titles become error envelopes. Only fatal store failures are returned
/// as `Err`.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    store: MemoryStore,
}

impl ToolDispatcher {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Declarations of every tool, in a fixed order
    pub fn specs(&self) -> Vec<ToolSpec> {
        MemoryTool::ALL.into_iter().map(MemoryTool::spec).collect()
    }

    /// Dispatch a tool call by name, parsing arguments from JSON.
    pub fn dispatch(&self, name: &str, arguments_json: &str) -> Result<ToolOutput, EngineError> {
        debug!("Dispatching tool '{}' with args: {}", name, arguments_json);

        let tool = match MemoryTool::parse(name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!("Unknown tool requested: {}", name);
                return Ok(ToolOutput::error(e.to_string()));
            }
        };

        match ToolInput::from_json(name, arguments_json) {
            Ok(input) => self.execute(tool, &input),
            Err(e) => Ok(ToolOutput::error(
                EngineError::Validation {
                    tool: name.to_string(),
                    reason: e.to_string(),
                }
                .to_string(),
            )),
        }
    }

    /// Run an already-resolved tool against parsed arguments
    pub fn execute(&self, tool: MemoryTool, input: &ToolInput) -> Result<ToolOutput, EngineError> {
        match self.run(tool, input) {
            Ok(output) => Ok(output),
            Err(e) if e.is_recoverable() => {
                debug!("Tool '{}' returned error envelope: {}", tool, e);
                Ok(ToolOutput::error(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn run(&self, tool: MemoryTool, input: &ToolInput) -> Result<ToolOutput, EngineError> {
        match tool {
            MemoryTool::WriteMemory => {
                let args: WriteArgs = parse_args(tool, input)?;
                let stored = self
                    .store
                    .write(&args.topic, &args.title, &args.content, args.tags)?;
                Ok(ToolOutput::ok(&Stored { stored: &stored }))
            }
            MemoryTool::ReadMemory => {
                let filter: ReadFilter = parse_args(tool, input)?;
                Ok(ToolOutput::ok(&self.store.read(&filter)?))
            }
            MemoryTool::UpdateMemory => {
                let args: UpdateArgs = parse_args(tool, input)?;
                self.store.update(
                    &args.topic,
                    &args.title,
                    args.new_content.as_deref(),
                    args.new_tags,
                )?;
                Ok(ToolOutput::ok(&Updated {
                    message: "memory updated",
                }))
            }
            MemoryTool::DeleteMemory => {
                let args: DeleteArgs = parse_args(tool, input)?;
                let deleted_count = self.store.delete(&args.topic, args.title.as_deref())?;
                Ok(ToolOutput::ok(&Deleted {
                    message: format!("deleted {} memories", deleted_count),
                    deleted_count,
                }))
            }
            MemoryTool::ListTopics => {
                let topics = self.store.list_topics()?;
                Ok(ToolOutput::ok(&Topics {
                    total_topics: topics.len(),
                    topics: &topics,
                }))
            }
            MemoryTool::GetStatistics => Ok(ToolOutput::ok(&self.store.get_statistics()?)),
            MemoryTool::SummarizeTopic => {
                let args: SummarizeArgs = parse_args(tool, input)?;
                let digest = self.store.summarize_topic(&args.topic)?;
                Ok(ToolOutput::ok(&Summary {
                    summary_data: &digest,
                }))
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: MemoryTool, input: &ToolInput) -> Result<T, EngineError> {
    input.parse().map_err(|e| EngineError::Validation {
        tool: tool.name().to_string(),
        reason: e.to_string(),
    })
}
