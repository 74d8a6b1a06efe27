//! Provider trait and the request/response shapes exchanged with the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

// ── Request ─────────────────────────────────────────────────────────

/// A single text fragment of a request turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One conversation turn: a role marker plus ordered parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn from ordered text parts.
    pub fn user<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: "user".to_string(),
            parts: parts.into_iter().map(Part::text).collect(),
        }
    }
}

/// A generation request. Sampling parameters live on the model handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents }
    }
}

// ── Response ────────────────────────────────────────────────────────

/// Raw model response. Every level is optional; the model may return text
/// directly, spread it across candidate parts, or return nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Prompt-level feedback; a non-empty `block_reason` means the prompt was rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Where the usable text of a response lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseContent<'a> {
    /// Non-empty top-level text (already trimmed).
    DirectText(&'a str),
    /// No direct text; text must be collected from candidate parts.
    CandidateParts(&'a [Candidate]),
    /// Nothing to extract.
    Neither,
}

impl ModelResponse {
    /// Build a response that carries only direct text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Build a single-candidate response from ordered part texts.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: parts
                        .into_iter()
                        .map(|t| ResponsePart {
                            text: Some(t.into()),
                        })
                        .collect(),
                    role: Some("model".to_string()),
                }),
                finish_reason: None,
            }],
            ..Default::default()
        }
    }

    /// Build a response whose prompt was blocked.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some(reason.into()),
            }),
            ..Default::default()
        }
    }

    /// Non-empty block reason, if the prompt was rejected.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
            .filter(|r| !r.is_empty())
    }

    /// Classify the response shape. Direct text wins over candidates.
    pub fn content(&self) -> ResponseContent<'_> {
        match (self.text.as_deref().map(str::trim), self.candidates.as_slice()) {
            (Some(text), _) if !text.is_empty() => ResponseContent::DirectText(text),
            (_, []) => ResponseContent::Neither,
            (_, candidates) => ResponseContent::CandidateParts(candidates),
        }
    }
}

// ── Provider trait ──────────────────────────────────────────────────

/// A configured handle to an external model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier this handle talks to.
    fn model_name(&self) -> &str;

    /// Send one generation request. No retries.
    async fn generate(&self, request: GenerateRequest) -> Result<ModelResponse, LlmError>;
}
