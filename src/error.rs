//! Error types for mail-triage.

use crate::pipeline::types::ErrorCode;

/// Fixed message returned when no Gemini credential is configured.
pub const MISSING_API_KEY_MESSAGE: &str = "Missing GEMINI_API_KEY (or GOOGLE_API_KEY) environment variable. Set it in your environment or .env file.";

/// Top-level error type for the service.
///
/// Classification and upload failures are rendered per request and never
/// escape the server; only listener I/O ends the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
///
/// Variants follow the failure categories the classifier distinguishes:
/// quota exhaustion, malformed requests, generic API failures and
/// everything else.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} quota exhausted: {reason}")]
    RateLimited { provider: String, reason: String },

    #[error("Provider {provider} rejected the request: {reason}")]
    InvalidRequest { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}: {reason}")]
    AuthFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while acquiring a model handle.
#[derive(Debug, thiserror::Error)]
pub enum ModelClientError {
    #[error("No API credential found (checked {checked})")]
    MissingCredential { checked: String },

    #[error("Failed to construct model handle: {0}")]
    Construction(#[from] LlmError),
}

/// Failures turning an upload or form field into email text.
///
/// These are caller-side validation errors, rendered as HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("No selected file")]
    NoSelectedFile,

    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("Error extracting text from PDF: {0}")]
    Pdf(String),

    #[error("Unable to decode text file")]
    UndecodableText,

    #[error("Error reading upload: {0}")]
    Read(String),

    #[error("Email text is required")]
    MissingEmailText,
}

/// Classification failure, one variant per machine-readable error code.
///
/// `Display` renders the human-readable `reason` sent to callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error("Prompt blocked: {0}")]
    PromptBlocked(String),

    #[error("Empty response from Gemini model")]
    EmptyResponse,

    #[error("Could not parse Gemini response as JSON")]
    JsonParse { original_response: String },

    #[error("{reason}")]
    InvalidResponseFormat {
        reason: String,
        original_response: String,
    },

    #[error("Gemini quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid request to Gemini API: {0}")]
    InvalidRequest(String),

    #[error("Gemini API error: {0}")]
    Api(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ClassifyError {
    /// Machine-readable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingApiKey => ErrorCode::MissingApiKey,
            Self::PromptBlocked(_) => ErrorCode::PromptBlocked,
            Self::EmptyResponse => ErrorCode::EmptyResponse,
            Self::JsonParse { .. } => ErrorCode::JsonParseError,
            Self::InvalidResponseFormat { .. } => ErrorCode::InvalidResponseFormat,
            Self::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::Api(_) => ErrorCode::GeminiApiError,
            Self::Unexpected(_) => ErrorCode::UnexpectedError,
        }
    }

    /// The raw model output, for the variants that carry it.
    pub fn original_response(&self) -> Option<&str> {
        match self {
            Self::JsonParse { original_response }
            | Self::InvalidResponseFormat {
                original_response, ..
            } => Some(original_response),
            _ => None,
        }
    }
}

impl From<LlmError> for ClassifyError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited { reason, .. } => Self::QuotaExceeded(reason),
            LlmError::InvalidRequest { reason, .. } => Self::InvalidRequest(reason),
            LlmError::RequestFailed { reason, .. } | LlmError::AuthFailed { reason, .. } => {
                Self::Api(reason)
            }
            LlmError::InvalidResponse { reason, .. } => Self::Unexpected(reason),
            LlmError::Json(e) => Self::Unexpected(e.to_string()),
        }
    }
}

impl From<ModelClientError> for ClassifyError {
    fn from(err: ModelClientError) -> Self {
        match err {
            ModelClientError::MissingCredential { .. } => Self::MissingApiKey,
            ModelClientError::Construction(e) => e.into(),
        }
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
