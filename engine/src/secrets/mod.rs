pub mod cache;
pub mod string;

pub use cache::SecretCache;
pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::io::{self, Write};
use std::sync::OnceLock;

/// SecretManager resolves API keys.
///
/// Lookup order for a key such as `openai_api_key`:
/// 1. the environment variable of the same name in upper case (`OPENAI_API_KEY`)
/// 2. the OS keychain (Keychain, Credential Manager, Secret Service)
/// 3. an interactive prompt, whose answer is stored in the keychain
///
/// The SecretManager also scrubs key-shaped strings from text shown to the user.
pub struct SecretManager {
    service_name: String,
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns match:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,} (including sk-proj-, sk-test-)
/// - GitHub tokens: ghp_[a-zA-Z0-9]{36}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static [Regex] {
    SECRET_PATTERNS.get_or_init(|| {
        [
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"ghp_[a-zA-Z0-9]{36}",
            r"Bearer\s+[^\s]{20,}",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

impl SecretManager {
    /// The service name namespaces secrets in the OS keychain.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Name of the environment variable consulted for `key`
    pub fn env_var_name(key: &str) -> String {
        key.to_uppercase()
    }

    /// Retrieves a secret from the environment or the OS keychain.
    ///
    /// If neither has it, prompts the user interactively and stores the
    /// provided value in the keychain immediately.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<String, EngineError> {
        if let Some(secret) = self.from_env(key) {
            tracing::debug!("Using secret '{}' from environment", key);
            return Ok(secret);
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(secret)
            }
            Err(keyring::Error::NoEntry) => {
                tracing::info!("Secret '{}' not found in keychain, prompting user", key);
                let secret = self.prompt_for_secret(key)?;

                self.set_secret(key, &secret)?;

                Ok(secret)
            }
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    fn from_env(&self, key: &str) -> Option<String> {
        std::env::var(Self::env_var_name(key))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Stores a secret in the OS keychain.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if keychain access fails
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.set_password(value).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }

    /// Checks whether a secret is available without prompting.
    pub fn has_secret(&self, key: &str) -> bool {
        if self.from_env(key).is_some() {
            return true;
        }

        match Entry::new(&self.service_name, key) {
            Ok(entry) => entry.get_password().is_ok(),
            Err(_) => false,
        }
    }

    /// Prompts on stderr and reads the value from stdin.
    fn prompt_for_secret(&self, key: &str) -> Result<String, EngineError> {
        eprint!("Enter value for '{}': ", key);
        io::stderr()
            .flush()
            .map_err(|e| EngineError::KeyringError(format!("Failed to flush stderr: {}", e)))?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| EngineError::KeyringError(format!("Failed to read input: {}", e)))?;

        let secret = input.trim().to_string();

        if secret.is_empty() {
            return Err(EngineError::KeyringError(
                "Secret cannot be empty".to_string(),
            ));
        }

        Ok(secret)
    }

    /// Scrubs secrets from text by replacing them with [REDACTED].
    ///
    /// # Examples
    /// ```
    /// use recall_engine::secrets::SecretManager;
    ///
    /// let manager = SecretManager::new("test");
    /// let scrubbed = manager.scrub("My API key is sk-1234567890abcdefghij");
    /// assert_eq!(scrubbed, "My API key is [REDACTED]");
    /// ```
    pub fn scrub(&self, text: &str) -> String {
        get_secret_patterns()
            .iter()
            .fold(text.to_string(), |acc, pattern| {
                pattern.replace_all(&acc, "[REDACTED]").into_owned()
            })
    }
}
