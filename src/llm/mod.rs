//! LLM integration for mail-triage.
//!
//! - [`provider`]: the `LlmProvider` trait and request/response shapes
//! - [`client`]: credential resolution and the lazily cached model handle
//! - [`gemini`]: the Gemini REST implementation
//!
//! Everything above the provider trait is transport-agnostic, so the
//! classifier can be driven by a stub in tests.

pub mod client;
pub mod gemini;
pub mod provider;

pub use client::{
    CREDENTIAL_SOURCES, CredentialSource, EnvCredentials, ModelClient, ModelFactory,
    resolve_api_key,
};
pub use gemini::{GeminiFactory, GeminiProvider};
pub use provider::*;

use std::sync::Arc;

/// Default Gemini model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Sampling temperature, kept low for consistent classification.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Upper bound on generated tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;

/// Generation settings baked into a model handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Output format the model must emit.
    pub response_mime_type: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            response_mime_type: "application/json".to_string(),
        }
    }
}

impl ModelSettings {
    /// Defaults, with the model id overridable through `GEMINI_MODEL`.
    pub fn from_env() -> Self {
        match std::env::var("GEMINI_MODEL") {
            Ok(model) if !model.trim().is_empty() => Self {
                model: model.trim().to_string(),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

/// Model client backed by environment credentials and the Gemini REST API.
pub fn create_model_client(settings: ModelSettings) -> ModelClient {
    ModelClient::new(
        settings,
        Arc::new(EnvCredentials),
        Arc::new(GeminiFactory::from_env()),
    )
}
