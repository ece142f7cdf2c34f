use crate::secrets::string::SecretString;
use crate::secrets::SecretManager;
use sdk::errors::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Memoizes resolved API keys for the lifetime of the process.
///
/// Resolution may prompt the user, so it should happen at most once per key.
#[derive(Clone)]
pub struct SecretCache {
    manager: Arc<SecretManager>,
    cache: Arc<RwLock<HashMap<String, SecretString>>>,
}

impl SecretCache {
    pub fn new(manager: Arc<SecretManager>) -> Self {
        Self {
            manager,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A cache pre-filled with known values, never consulting the manager
    /// for those keys
    pub fn with_secrets<I, K, V>(manager: Arc<SecretManager>, secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SecretString>,
    {
        let cache = secrets
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            manager,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Retrieves a secret. It checks the memory cache first.
    /// If not found, it asks the SecretManager (which may prompt the user),
    /// caches the result, and returns it.
    pub fn get_secret(&self, key: &str) -> Result<SecretString, EngineError> {
        {
            let cache = self.cache.read().map_err(poisoned)?;
            if let Some(secret) = cache.get(key) {
                return Ok(secret.clone());
            }
        }

        let secret = SecretString::new(self.manager.get_secret(key)?);

        self.cache
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), secret.clone());

        Ok(secret)
    }

    /// Pre-loads a set of keys. This ensures any interactive prompts happen early.
    pub fn preload(&self, keys: &[&str]) -> Result<(), EngineError> {
        for key in keys {
            self.get_secret(key)?;
        }
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> EngineError {
    EngineError::KeyringError("secret cache lock poisoned".to_string())
}
