//! Shared types for the classification pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ClassifyError;

// ── Result ──────────────────────────────────────────────────────────

/// Successful classification of one email.
///
/// `confidence` and `reason` are passed through from the model untouched,
/// whatever their JSON type. `keywords` and `reply` default to empty when the
/// model omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub productive: bool,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub reason: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reply: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Errors ──────────────────────────────────────────────────────────

/// Closed set of machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingApiKey,
    PromptBlocked,
    EmptyResponse,
    JsonParseError,
    InvalidResponseFormat,
    QuotaExceeded,
    InvalidRequest,
    GeminiApiError,
    UnexpectedError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::PromptBlocked => "prompt_blocked",
            Self::EmptyResponse => "empty_response",
            Self::JsonParseError => "json_parse_error",
            Self::InvalidResponseFormat => "invalid_response_format",
            Self::QuotaExceeded => "quota_exceeded",
            Self::InvalidRequest => "invalid_request",
            Self::GeminiApiError => "gemini_api_error",
            Self::UnexpectedError => "unexpected_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat error payload: `{"reason": ..., "error": ..., ...extra}`.
///
/// This is the library-level rendering of a [`ClassifyError`] for callers
/// that embed the classifier directly. The HTTP layer takes its `error` and
/// `reason` into [`ClassifyResponse`](crate::server::ClassifyResponse).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationError {
    pub reason: String,
    pub error: ErrorCode,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&ClassifyError> for ClassificationError {
    fn from(err: &ClassifyError) -> Self {
        let mut extra = Map::new();
        if let Some(original) = err.original_response() {
            extra.insert(
                "original_response".to_string(),
                Value::String(original.to_string()),
            );
        }
        Self {
            reason: err.to_string(),
            error: err.code(),
            extra,
        }
    }
}

impl From<ClassifyError> for ClassificationError {
    fn from(err: ClassifyError) -> Self {
        Self::from(&err)
    }
}
