//! Model client: credential resolution and the cached model handle.
//!
//! The handle is built at most once per client until [`ModelClient::reset`]
//! discards it. Construction is delegated to a [`ModelFactory`] so tests can
//! substitute a stub without touching the network.

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::SecretString;

use super::ModelSettings;
use super::provider::LlmProvider;
use crate::error::{LlmError, ModelClientError};

/// Environment entries checked for the API key, in order.
pub const CREDENTIAL_SOURCES: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Lookup of named credential entries.
pub trait CredentialSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads credentials from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Builds a model handle once a credential is available.
pub trait ModelFactory: Send + Sync {
    fn build(
        &self,
        api_key: SecretString,
        settings: &ModelSettings,
    ) -> Result<Arc<dyn LlmProvider>, LlmError>;
}

/// Resolve the API key: first source whose trimmed value is non-empty.
pub fn resolve_api_key(source: &dyn CredentialSource) -> Result<SecretString, ModelClientError> {
    CREDENTIAL_SOURCES
        .iter()
        .filter_map(|name| source.lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ModelClientError::MissingCredential {
            checked: CREDENTIAL_SOURCES.join(", "),
        })
}

/// Lazily-initialized, resettable model handle.
pub struct ModelClient {
    settings: ModelSettings,
    credentials: Arc<dyn CredentialSource>,
    factory: Arc<dyn ModelFactory>,
    cached: Mutex<Option<Arc<dyn LlmProvider>>>,
}

impl ModelClient {
    pub fn new(
        settings: ModelSettings,
        credentials: Arc<dyn CredentialSource>,
        factory: Arc<dyn ModelFactory>,
    ) -> Self {
        Self {
            settings,
            credentials,
            factory,
            cached: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Return the cached handle, building it on first use.
    ///
    /// The lock is held across construction so concurrent first callers
    /// build exactly one handle.
    pub fn get_model(&self) -> Result<Arc<dyn LlmProvider>, ModelClientError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = cached.as_ref() {
            return Ok(Arc::clone(model));
        }

        let api_key = resolve_api_key(self.credentials.as_ref())?;
        let model = self.factory.build(api_key, &self.settings)?;
        *cached = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Discard the cached handle. The next `get_model` re-resolves credentials.
    pub fn reset(&self) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
