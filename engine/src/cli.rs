//! CLI interface for Recall
//!
//! This module provides the command-line interface using clap's derive API.
//! Without a subcommand the interactive chat starts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recall, a personal memory butler
///
/// Chat with an assistant that remembers what you tell it, or inspect the
/// memory store directly.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat session (default)
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The message to send
        text: String,
    },

    /// List memory topics
    Topics,

    /// Show memory statistics
    Stats,

    /// Show every memory in a topic
    Show {
        /// Topic name
        topic: String,
    },

    /// Search memories
    Search {
        /// Only search this topic
        #[arg(long)]
        topic: Option<String>,

        /// Exact title (case-insensitive)
        #[arg(long)]
        title: Option<String>,

        /// Keyword to look for anywhere in a memory
        #[arg(short, long)]
        query: Option<String>,

        /// Match memories carrying any of these tags (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Delete a memory, or a whole topic when no title is given
    Forget {
        /// Topic name
        topic: String,

        /// Title of the memories to delete
        #[arg(long)]
        title: Option<String>,
    },
}

impl Cli {
    /// The command to run, defaulting to `chat`
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Chat)
    }
}
