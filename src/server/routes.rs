//! REST endpoints: classification, service info, liveness.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::{ClassifyError, UploadError};
use crate::pipeline::types::{ClassificationError, ClassificationResult, ErrorCode};
use crate::upload::{ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES, extract_email_text, require_email_text};

// ── Response shape ──────────────────────────────────────────────────

/// Caller-facing classification body. `error` is null on success; on
/// failure the result fields are null and `reason` describes the error.
/// `confidence` and `reason` carry whatever JSON the model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub productive: Option<bool>,
    pub confidence: Option<Value>,
    pub reason: Option<Value>,
    pub keywords: Option<Vec<String>>,
    pub reply: Option<String>,
    pub error: Option<ErrorCode>,
}

impl From<Result<ClassificationResult, ClassifyError>> for ClassifyResponse {
    fn from(outcome: Result<ClassificationResult, ClassifyError>) -> Self {
        match outcome {
            Ok(result) => Self {
                productive: Some(result.productive),
                confidence: result.confidence,
                reason: result.reason,
                keywords: Some(result.keywords),
                reply: Some(result.reply),
                error: None,
            },
            Err(err) => {
                let payload = ClassificationError::from(err);
                Self {
                    productive: None,
                    confidence: None,
                    reason: Some(Value::String(payload.reason)),
                    keywords: None,
                    reply: None,
                    error: Some(payload.error),
                }
            }
        }
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Why the email text could not be obtained from a request.
enum ExtractFailure {
    /// Caller error, rendered as 400 with the message.
    Invalid(UploadError),
    /// Server-side failure, rendered as a masked 500.
    Internal(String),
}

impl From<UploadError> for ExtractFailure {
    fn from(err: UploadError) -> Self {
        Self::Invalid(err)
    }
}

#[derive(Debug, Default, Deserialize)]
struct EmailForm {
    #[serde(default)]
    email_text: String,
}

/// POST /classify-email
///
/// Accepts a multipart upload (`file`, `.txt`/`.pdf`), a JSON body with
/// `email_text`, or a url-encoded form field `email_text`.
pub(super) async fn classify_email(State(state): State<AppState>, request: Request) -> Response {
    let request_id = Uuid::new_v4();

    let email_text = match email_text_from_request(request).await {
        Ok(text) => text,
        Err(ExtractFailure::Invalid(e)) => {
            warn!(%request_id, error = %e, "Rejected classification request");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
        Err(ExtractFailure::Internal(reason)) => {
            error!(%request_id, reason = %reason, "Unexpected error while classifying email");
            return internal_error();
        }
    };

    info!(
        %request_id,
        chars = email_text.chars().count(),
        "Classifying email"
    );

    let outcome = state.classifier.classify(&email_text).await;
    match &outcome {
        Ok(result) => info!(
            %request_id,
            productive = result.productive,
            confidence = ?result.confidence,
            keywords = result.keywords.len(),
            "Email classified"
        ),
        Err(e) => warn!(
            %request_id,
            code = e.code().as_str(),
            reason = %e,
            "Classification failed"
        ),
    }

    Json(ClassifyResponse::from(outcome)).into_response()
}

async fn email_text_from_request(request: Request) -> Result<String, ExtractFailure> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        return email_text_from_multipart(request).await;
    }

    if content_type.starts_with("application/json") || content_type.contains("+json") {
        let body = Bytes::from_request(request, &())
            .await
            .map_err(|e| UploadError::Read(e.body_text()))?;
        // Malformed JSON is treated like a missing field.
        let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        let text = payload
            .get("email_text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Ok(require_email_text(text)?);
    }

    let form = match Form::<EmailForm>::from_request(request, &()).await {
        Ok(Form(form)) => form,
        Err(_) => EmailForm::default(),
    };
    Ok(require_email_text(&form.email_text)?)
}

async fn email_text_from_multipart(request: Request) -> Result<String, ExtractFailure> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| UploadError::Read(e.body_text()))?;

    let mut upload: Option<(String, Bytes)> = None;
    let mut email_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Read(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Read(e.body_text()))?;
                // A file input left empty arrives with a blank filename.
                if !filename.trim().is_empty() {
                    upload = Some((filename, bytes));
                }
            }
            "email_text" => {
                email_text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| UploadError::Read(e.body_text()))?,
                );
            }
            _ => {}
        }
    }

    match upload {
        Some((filename, bytes)) => {
            let extracted =
                tokio::task::spawn_blocking(move || extract_email_text(&filename, &bytes))
                    .await
                    .map_err(|e| ExtractFailure::Internal(e.to_string()))?;
            Ok(extracted?)
        }
        None => Ok(require_email_text(email_text.as_deref().unwrap_or_default())?),
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

// ── Info ────────────────────────────────────────────────────────────

/// GET /info
pub(super) async fn info_handler() -> impl IntoResponse {
    Json(json!({
        "service": "Email Analyzer and Classifier",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Classifies emails as productive or non-productive using AI.",
        "endpoints": {
            "/": "API information",
            "/classify-email": "POST - Classifies email. Accepts JSON with \"email_text\" field or file upload (.txt or .pdf)",
            "/info": "GET - Service information",
        },
        "accepted_file_types_for_upload": ALLOWED_EXTENSIONS,
        "max_file_size_for_upload": MAX_UPLOAD_BYTES,
    }))
}

/// GET /
pub(super) async fn home() -> impl IntoResponse {
    Json(json!({
        "message": "Email classifier API is running.",
        "status": "OK",
        "use": "See /info for more details.",
    }))
}
