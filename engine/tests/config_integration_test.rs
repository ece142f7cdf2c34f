//! Integration tests for configuration management
//!
//! These tests verify that the Config struct can be properly loaded,
//! validated, and processed with path expansion.

use recall_engine::config::{Config, STORE_FILE_NAME};
use sdk::errors::EngineError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_config_toml_parsing() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let path = write_config(
        temp_dir.path(),
        &format!(
            r#"
[core]
log_level = "debug"
data_dir = "{}"

[llm]
default_provider = "ollama"

[llm.ollama]
base_url = "http://localhost:11434"
model = "qwen2.5:7b"

[agent]
max_tool_iterations = 5
exit_commands = ["Bye", " EXIT "]
"#,
            data_dir.display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.llm.default_provider, "ollama");
    assert_eq!(config.llm.ollama.model, "qwen2.5:7b");
    assert_eq!(config.agent.max_tool_iterations, 5);
    assert_eq!(config.agent.exit_commands, vec!["bye", "exit"]);

    // Sections not present in the file keep their defaults
    assert_eq!(config.llm.openai.model, "gpt-4.1-mini");
    assert_eq!(config.agent.llm_timeout_secs, 300);
    assert_eq!(config.agent.assistant_name, "Linali");

    // Data directory is created and the store defaults inside it
    assert!(data_dir.is_dir());
    assert_eq!(config.store_path(), data_dir.join(STORE_FILE_NAME));
}

#[test]
fn test_minimal_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        &format!(
            "[core]\ndata_dir = \"{}\"\n",
            temp_dir.path().join("d").display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.llm.default_provider, "openai");
    assert_eq!(config.agent.max_tool_iterations, 20);
    assert_eq!(config.agent.exit_commands, vec!["exit", "quit"]);
    assert!(config.agent.system_prompt.is_none());
}

#[test]
fn test_store_path_override_expands_home() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        &format!(
            "[core]\ndata_dir = \"{}\"\n\n[memory]\nstore_path = \"~/notes/memories.json\"\n",
            temp_dir.path().display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();
    let home = dirs::home_dir().unwrap();
    assert_eq!(config.store_path(), home.join("notes").join("memories.json"));
}

#[test]
fn test_invalid_values_are_config_errors() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().display().to_string();

    for body in [
        "[llm]\ndefault_provider = \"anthropic\"\n",
        "[llm.openai]\ntemperature = 3.5\n",
        "[agent]\nmax_tool_iterations = 0\n",
        "[agent]\nllm_timeout_secs = 0\n",
        "[core]\nlog_level = \"loud\"\n",
        "this is not toml",
    ] {
        let full = if body.starts_with("[core]") {
            format!("{}data_dir = \"{}\"\n", body, data_dir)
        } else {
            format!("[core]\ndata_dir = \"{}\"\n\n{}", data_dir, body)
        };
        let path = write_config(temp_dir.path(), &full);

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(
            matches!(err, EngineError::Config(_)),
            "expected config error for {:?}",
            body
        );
    }
}

#[test]
fn test_missing_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let config = Config::load_or_create_at(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.llm.default_provider, "openai");

    // The written file keeps the portable ~ form and parses back
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("~/.recall"));
    let reloaded = Config::load_or_create_at(&path).unwrap();
    assert_eq!(reloaded.core.data_dir, config.core.data_dir);
}

#[test]
fn test_custom_system_prompt() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        &format!(
            "[core]\ndata_dir = \"{}\"\n\n[agent]\nsystem_prompt = \"Be brief.\"\n",
            temp_dir.path().display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.agent.system_prompt.as_deref(), Some("Be brief."));
}
