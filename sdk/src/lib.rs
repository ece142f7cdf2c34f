//! Recall SDK
//!
//! Shared library providing the error taxonomy and the tool wire types used
//! by the engine and by anything that speaks to its tools.

/// Error types and handling
pub mod errors;

/// Tool input/output types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, RecallErrorExt};
pub use types::{ToolError, ToolInput, ToolOutput, ToolSpec, ToolStatus};
