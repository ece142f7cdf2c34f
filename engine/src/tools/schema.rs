//! Tool declarations advertised to the model, and the typed argument shapes
//! each tool accepts.

use sdk::errors::EngineError;
use sdk::types::ToolSpec;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;

/// The closed set of memory tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryTool {
    WriteMemory,
    ReadMemory,
    UpdateMemory,
    DeleteMemory,
    ListTopics,
    GetStatistics,
    SummarizeTopic,
}

impl MemoryTool {
    /// All tools in declaration order
    pub const ALL: [MemoryTool; 7] = [
        MemoryTool::WriteMemory,
        MemoryTool::ReadMemory,
        MemoryTool::UpdateMemory,
        MemoryTool::DeleteMemory,
        MemoryTool::ListTopics,
        MemoryTool::GetStatistics,
        MemoryTool::SummarizeTopic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MemoryTool::WriteMemory => "write_memory",
            MemoryTool::ReadMemory => "read_memory",
            MemoryTool::UpdateMemory => "update_memory",
            MemoryTool::DeleteMemory => "delete_memory",
            MemoryTool::ListTopics => "list_topics",
            MemoryTool::GetStatistics => "get_statistics",
            MemoryTool::SummarizeTopic => "summarize_topic",
        }
    }

    /// Resolve a tool name sent by the model
    pub fn parse(name: &str) -> Result<Self, EngineError> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| EngineError::UnknownTool(name.to_string()))
    }

    pub fn description(self) -> &'static str {
        match self {
            MemoryTool::WriteMemory => {
                "Save an important piece of information to the memory store. Provide a topic \
                 (category), a short title, the detailed content, and optional tags."
            }
            MemoryTool::ReadMemory => {
                "Look up remembered information. Filter by topic, exact title, tags, or a \
                 keyword query; with no filters every memory is returned."
            }
            MemoryTool::UpdateMemory => "Update the content or tags of an existing memory.",
            MemoryTool::DeleteMemory => {
                "Delete the memories with a given title in a topic, or the whole topic when \
                 no title is given."
            }
            MemoryTool::ListTopics => {
                "List every memory topic with its item count, tags and most recent activity."
            }
            MemoryTool::GetStatistics => {
                "Get overall statistics: total memories, total topics and the most used tags."
            }
            MemoryTool::SummarizeTopic => {
                "Fetch every memory in a topic as structured data so that you can write a \
                 human-readable summary of it."
            }
        }
    }

    /// Names of the arguments the tool cannot run without
    pub fn required(self) -> &'static [&'static str] {
        match self {
            MemoryTool::WriteMemory => &["topic", "title", "content"],
            MemoryTool::ReadMemory => &[],
            MemoryTool::UpdateMemory => &["topic", "title"],
            MemoryTool::DeleteMemory => &["topic"],
            MemoryTool::ListTopics => &[],
            MemoryTool::GetStatistics => &[],
            MemoryTool::SummarizeTopic => &["topic"],
        }
    }

    /// JSON Schema of the argument object
    pub fn parameters(self) -> Value {
        let properties = match self {
            MemoryTool::WriteMemory => json!({
                "topic": {"type": "string", "description": "Category the memory belongs to"},
                "title": {"type": "string", "description": "Short title of the memory"},
                "content": {"type": "string", "description": "Detailed content of the memory"},
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Related tags such as #life, #work, #ideas",
                    "default": []
                }
            }),
            MemoryTool::ReadMemory => json!({
                "topic": {"type": "string", "description": "Topic to search in"},
                "title": {"type": "string", "description": "Exact title to look up"},
                "query": {"type": "string", "description": "Keyword search"},
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Filter by tags"
                }
            }),
            MemoryTool::UpdateMemory => json!({
                "topic": {"type": "string", "description": "Topic the memory is in"},
                "title": {"type": "string", "description": "Title of the memory to update"},
                "new_content": {"type": "string", "description": "New content (optional)"},
                "new_tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Replacement tag list (optional)"
                }
            }),
            MemoryTool::DeleteMemory => json!({
                "topic": {"type": "string", "description": "Topic to delete from"},
                "title": {
                    "type": "string",
                    "description": "Title to delete (optional; omit to delete the whole topic)"
                }
            }),
            MemoryTool::ListTopics | MemoryTool::GetStatistics => json!({}),
            MemoryTool::SummarizeTopic => json!({
                "topic": {"type": "string", "description": "Name of the topic to summarize"}
            }),
        };

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !self.required().is_empty() {
            schema["required"] = json!(self.required());
        }
        schema
    }

    pub fn spec(self) -> ToolSpec {
        ToolSpec::new(self.name(), self.description(), self.parameters())
    }
}

impl fmt::Display for MemoryTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of `write_memory`
#[derive(Debug, Clone, Deserialize)]
pub struct WriteArgs {
    pub topic: String,
    pub title: String,
    pub content: String,
    pub tags: Option<Vec<String>>,
}

/// Arguments of `update_memory`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateArgs {
    pub topic: String,
    pub title: String,
    pub new_content: Option<String>,
    pub new_tags: Option<Vec<String>>,
}

/// Arguments of `delete_memory`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteArgs {
    pub topic: String,
    pub title: Option<String>,
}

/// Arguments of `summarize_topic`
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeArgs {
    pub topic: String,
}
