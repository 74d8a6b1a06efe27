//! Gemini provider over the `generateContent` REST endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ModelSettings;
use super::client::ModelFactory;
use super::provider::{Content, GenerateRequest, LlmProvider, ModelResponse};
use crate::error::LlmError;

const PROVIDER: &str = "gemini";

/// Public Gemini API endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default HTTP timeout for a single generation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: &'a [Content],
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'a str,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Gemini model handle.
pub struct GeminiProvider {
    client: Client,
    api_key: SecretString,
    settings: ModelSettings,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: SecretString,
        settings: ModelSettings,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            settings,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.settings.model
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, request: GenerateRequest) -> Result<ModelResponse, LlmError> {
        let body = GeminiRequest {
            contents: &request.contents,
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
                response_mime_type: &self.settings.response_mime_type,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            debug!(status = %status, "Gemini returned an error status");
            return Err(status_error(status, &text));
        }

        let parsed: ModelResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to decode response: {e}"),
            })?;

        debug!(
            model = %self.settings.model,
            candidates = parsed.candidates.len(),
            finish_reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none"),
            "Gemini response received"
        );
        Ok(parsed)
    }
}

/// Map a non-2xx response to a provider error category.
fn status_error(status: StatusCode, body: &str) -> LlmError {
    let (message, api_status) = match serde_json::from_str::<GeminiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            (parsed.error.message, parsed.error.status)
        }
        Ok(parsed) => (format!("{status}: {body}"), parsed.error.status),
        Err(_) => (format!("{status}: {body}"), String::new()),
    };
    let provider = PROVIDER.to_string();

    match (status, api_status.as_str()) {
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "RESOURCE_EXHAUSTED") => LlmError::RateLimited {
            provider,
            reason: message,
        },
        (StatusCode::BAD_REQUEST, _) | (_, "INVALID_ARGUMENT") => LlmError::InvalidRequest {
            provider,
            reason: message,
        },
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => LlmError::AuthFailed {
            provider,
            reason: message,
        },
        _ => LlmError::RequestFailed {
            provider,
            reason: message,
        },
    }
}

/// Builds [`GeminiProvider`] handles.
#[derive(Debug, Clone)]
pub struct GeminiFactory {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiFactory {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeminiFactory {
    /// Factory honoring `GEMINI_API_BASE` when set.
    pub fn from_env() -> Self {
        let base_url = std::env::var("GEMINI_API_BASE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            base_url,
            ..Default::default()
        }
    }
}

impl ModelFactory for GeminiFactory {
    fn build(
        &self,
        api_key: SecretString,
        settings: &ModelSettings,
    ) -> Result<Arc<dyn LlmProvider>, LlmError> {
        let provider = GeminiProvider::new(api_key, settings.clone(), &self.base_url, self.timeout)?;
        tracing::info!("Using Gemini (model: {})", settings.model);
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone)]
    struct MockState {
        status: AxumStatus,
        body: Value,
        seen: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn generate_content(
        State(state): State<MockState>,
        Path(model_call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.seen.lock().unwrap().push((model_call, key, body));
        (state.status, Json(state.body.clone()))
    }

    /// Start a mock Gemini endpoint, return (base_url, recorded requests).
    async fn start_mock(
        status: AxumStatus,
        body: Value,
    ) -> (String, Arc<Mutex<Vec<(String, Option<String>, Value)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body,
            seen: Arc::clone(&seen),
        };
        let app = Router::new()
            .route("/v1beta/models/{model_call}", post(generate_content))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://127.0.0.1:{port}/"), seen)
    }

    fn provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::new(
            SecretString::from("test-key"),
            ModelSettings::default(),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> GenerateRequest {
        GenerateRequest::new(vec![Content::user(["instruction", "prompt"])])
    }

    #[tokio::test]
    async fn sends_generation_config_and_key() {
        let (base, seen) = start_mock(
            AxumStatus::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "{}"}]}}]}),
        )
        .await;

        let response = provider(&base).generate(request()).await.unwrap();
        assert_eq!(response.candidates.len(), 1);

        let seen = seen.lock().unwrap();
        let (model_call, key, body) = &seen[0];
        assert_eq!(model_call, "gemini-2.5-flash:generateContent");
        assert_eq!(key.as_deref(), Some("test-key"));
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "prompt");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn blocked_prompt_is_a_successful_response() {
        let (base, _) = start_mock(
            AxumStatus::OK,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        )
        .await;

        let response = provider(&base).generate(request()).await.unwrap();
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }

    #[tokio::test]
    async fn quota_status_maps_to_rate_limited() {
        let (base, _) = start_mock(
            AxumStatus::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}),
        )
        .await;

        let err = provider(&base).generate(request()).await.unwrap_err();
        match err {
            LlmError::RateLimited { reason, .. } => assert_eq!(reason, "Quota exceeded"),
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bad_request_maps_to_invalid_request() {
        let (base, _) = start_mock(
            AxumStatus::BAD_REQUEST,
            json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}),
        )
        .await;

        let err = provider(&base).generate(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn server_error_maps_to_request_failed() {
        let (base, _) = start_mock(AxumStatus::INTERNAL_SERVER_ERROR, json!({"oops": true})).await;

        let err = provider(&base).generate(request()).await.unwrap_err();
        match err {
            LlmError::RequestFailed { reason, .. } => assert!(reason.contains("500")),
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_invalid_response() {
        let (base, _) = start_mock(AxumStatus::OK, json!({"candidates": "nope"})).await;

        let err = provider(&base).generate(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_request_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = provider(&format!("http://127.0.0.1:{port}"))
            .generate(request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }));
    }

    #[test]
    fn status_error_uses_api_status_when_http_status_is_generic() {
        let body = r#"{"error": {"message": "slow down", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, body);
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }

    #[test]
    fn status_error_forbidden_is_auth_failure() {
        let err = status_error(StatusCode::FORBIDDEN, "denied");
        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }

    #[test]
    fn factory_builds_named_handle() {
        let factory = GeminiFactory::default();
        let handle = factory
            .build(SecretString::from("k"), &ModelSettings::default())
            .unwrap();
        assert_eq!(handle.model_name(), "gemini-2.5-flash");
    }
}
