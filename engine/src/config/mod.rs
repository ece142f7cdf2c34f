//! Configuration management
//!
//! This module handles loading, validation, and management of the Recall configuration.
//! Configuration is stored in TOML format at ~/.recall/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **memory**: Location of the memory store file
//! - **llm**: LLM provider selection and provider settings
//! - **agent**: Conversation loop limits, exit commands and persona
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Creates the data directory if it doesn't exist
//!
//! # Examples
//!
//! ```no_run
//! use recall_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Store: {:?}", config.store_path());
//! println!("Default provider: {}", config.llm.default_provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the memory store inside the data directory
pub const STORE_FILE_NAME: &str = "memory_store.json";

/// Main configuration structure
///
/// Every section may be omitted from the file; missing sections and
/// fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Memory store settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Conversation loop settings
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryConfig {
    /// Store file path (supports ~ expansion). Defaults to
    /// `<data_dir>/memory_store.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used for conversations (openai, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            openai: OpenAIConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    // Note: API key comes from the environment or the OS keychain, not from config
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model/tool rounds within one user turn
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    /// Upper bound on a single model call, in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Inputs that end the session (matched case-insensitively)
    #[serde(default = "default_exit_commands")]
    pub exit_commands: Vec<String>,

    /// Replaces the built-in persona prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Name the assistant answers under
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: default_max_tool_iterations(),
            llm_timeout_secs: default_llm_timeout_secs(),
            exit_commands: default_exit_commands(),
            system_prompt: None,
            assistant_name: default_assistant_name(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.recall")
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tool_iterations() -> usize {
    20
}

fn default_llm_timeout_secs() -> u64 {
    300
}

fn default_exit_commands() -> Vec<String> {
    vec!["exit".to_string(), "quit".to_string()]
}

fn default_assistant_name() -> String {
    "Linali".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            temperature: default_temperature(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.recall/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Validates the configuration after loading and returns descriptive errors
    /// if validation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails (unknown provider, out-of-range limits)
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    /// Load configuration from `path`, writing a default file there first
    /// if it doesn't exist
    pub fn load_or_create_at(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable ~ paths
        let toml_string = toml::to_string_pretty(&Self::default())
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = Self::default();
        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.recall/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".recall").join("config.toml"))
    }

    /// Resolved location of the memory store file
    pub fn store_path(&self) -> PathBuf {
        self.memory
            .store_path
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join(STORE_FILE_NAME))
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates enumerated and ranged fields
    /// - Expands ~ in paths
    /// - Creates the data directory if it doesn't exist
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                valid_providers.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.openai.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.agent.max_tool_iterations == 0 {
            return Err(EngineError::Config(
                "max_tool_iterations must be at least 1".to_string(),
            ));
        }
        if self.agent.llm_timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm_timeout_secs must be at least 1".to_string(),
            ));
        }

        self.agent.exit_commands = self
            .agent
            .exit_commands
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(store_path) = &self.memory.store_path {
            self.memory.store_path = Some(expand_path(store_path)?);
        }

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.default_provider, "openai");
        assert_eq!(config.llm.openai.model, "gpt-4.1-mini");
        assert_eq!(config.agent.max_tool_iterations, 20);
        assert_eq!(config.agent.llm_timeout_secs, 300);
        assert_eq!(config.agent.exit_commands, vec!["exit", "quit"]);
        assert_eq!(config.agent.assistant_name, "Linali");
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_store_path_defaults_under_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.core.data_dir = temp_dir.path().to_path_buf();
        config.validate_and_process().unwrap();

        assert_eq!(config.store_path(), temp_dir.path().join(STORE_FILE_NAME));
    }

    #[test]
    fn test_zero_iteration_limit_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.core.data_dir = temp_dir.path().to_path_buf();
        config.agent.max_tool_iterations = 0;

        assert!(matches!(
            config.validate_and_process(),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(
            config.llm.default_provider,
            deserialized.llm.default_provider
        );
        assert!(deserialized.memory.store_path.is_none());
    }
}
