//! Response normalizer: turns raw model output into a typed result.
//!
//! Stages run in a fixed order and each failure is terminal:
//! 1. block check (prompt feedback)
//! 2. text extraction (direct text, else candidate parts)
//! 3. emptiness check
//! 4. JSON parse
//! 5. schema validation (`productive` required, typed `productive`,
//!    `keywords` and `reply`)
//! 6. defaulting (`keywords`, `reply`)
//!
//! `confidence` and `reason` are carried as raw JSON and never rejected.

use serde_json::Value;

use crate::error::ClassifyError;
use crate::llm::provider::{Candidate, ModelResponse, ResponseContent};
use crate::pipeline::types::ClassificationResult;

/// Normalize a raw model response into a classification or a typed error.
pub fn normalize(response: &ModelResponse) -> Result<ClassificationResult, ClassifyError> {
    if let Some(reason) = response.block_reason() {
        return Err(ClassifyError::PromptBlocked(reason.to_string()));
    }

    let text = extract_text(response);
    if text.is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }

    parse_payload(&text)
}

/// Collect the usable text of a response; empty when there is none.
pub fn extract_text(response: &ModelResponse) -> String {
    match response.content() {
        ResponseContent::DirectText(text) => text.to_string(),
        ResponseContent::CandidateParts(candidates) => join_candidate_parts(candidates),
        ResponseContent::Neither => String::new(),
    }
}

fn join_candidate_parts(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parse extracted text into a classification result.
pub fn parse_payload(text: &str) -> Result<ClassificationResult, ClassifyError> {
    let payload: Value =
        serde_json::from_str(strip_code_fence(text)).map_err(|_| ClassifyError::JsonParse {
            original_response: text.to_string(),
        })?;

    let has_productive = payload
        .as_object()
        .is_some_and(|object| object.contains_key("productive"));
    if !has_productive {
        return Err(ClassifyError::InvalidResponseFormat {
            reason: "Gemini response does not contain 'productive' field".to_string(),
            original_response: text.to_string(),
        });
    }

    serde_json::from_value(payload).map_err(|e| ClassifyError::InvalidResponseFormat {
        reason: format!("Gemini response has invalid field types: {e}"),
        original_response: text.to_string(),
    })
}

/// Unwrap a markdown code fence around a JSON body, if present.
///
/// A fully fenced body parses; an unterminated fence is left as is and
/// fails as a JSON parse error.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    match inner.strip_suffix("```") {
        Some(body) => body.trim(),
        None => trimmed,
    }
}
