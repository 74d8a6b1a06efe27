//! Classifier: sequences prompt construction, the model call and
//! normalization.
//!
//! `classify` is total: every failure, from a missing credential to an
//! unparseable model reply, comes back as a [`ClassifyError`]. Nothing is
//! retried and nothing is logged here; rendering is the caller's concern.

use crate::error::ClassifyError;
use crate::llm::client::ModelClient;
use crate::llm::provider::{Content, GenerateRequest};
use crate::pipeline::normalizer::normalize;
use crate::pipeline::prompt::{SYSTEM_INSTRUCTION, build_prompt};
use crate::pipeline::types::ClassificationResult;

/// Productive / non-productive email classifier.
pub struct Classifier {
    models: ModelClient,
}

impl Classifier {
    pub fn new(models: ModelClient) -> Self {
        Self { models }
    }

    /// Classify one email body.
    ///
    /// The caller guarantees `email_text` is non-empty after trimming.
    pub async fn classify(&self, email_text: &str) -> Result<ClassificationResult, ClassifyError> {
        let model = self.models.get_model()?;
        let response = model.generate(build_request(email_text)).await?;
        normalize(&response)
    }

    /// Drop the cached model handle; the next call re-resolves credentials.
    pub fn reset_model(&self) {
        self.models.reset();
    }

    pub fn model_client(&self) -> &ModelClient {
        &self.models
    }
}

/// Build the model request: one user turn, instruction part then prompt.
pub fn build_request(email_text: &str) -> GenerateRequest {
    GenerateRequest::new(vec![Content::user([
        SYSTEM_INSTRUCTION.to_string(),
        build_prompt(email_text),
    ])])
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use secrecy::SecretString;

    use super::*;
    use crate::error::{LlmError, MISSING_API_KEY_MESSAGE};
    use crate::llm::ModelSettings;
    use crate::llm::client::{CredentialSource, ModelFactory};
    use crate::llm::provider::{LlmProvider, ModelResponse};
    use crate::pipeline::types::{ClassificationError, ErrorCode};

    /// Credential source with a lookup counter.
    struct SpyCredentials {
        key: Option<&'static str>,
        lookups: AtomicUsize,
    }

    impl SpyCredentials {
        fn with_key(key: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                key,
                lookups: AtomicUsize::new(0),
            })
        }
    }

    impl CredentialSource for SpyCredentials {
        fn lookup(&self, name: &str) -> Option<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            (name == "GEMINI_API_KEY").then(|| self.key.map(str::to_string)).flatten()
        }
    }

    /// Canned outcome for the mock model.
    #[derive(Clone)]
    enum Reply {
        Response(ModelResponse),
        RateLimited,
        InvalidRequest,
        ApiFailure,
        Garbled,
    }

    struct MockModel {
        reply: Reply,
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<GenerateRequest>>>,
    }

    #[async_trait]
    impl LlmProvider for MockModel {
        fn model_name(&self) -> &str {
            "mock-gemini"
        }

        async fn generate(&self, request: GenerateRequest) -> Result<ModelResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            let provider = "mock".to_string();
            match &self.reply {
                Reply::Response(r) => Ok(r.clone()),
                Reply::RateLimited => Err(LlmError::RateLimited {
                    provider,
                    reason: "429 quota".into(),
                }),
                Reply::InvalidRequest => Err(LlmError::InvalidRequest {
                    provider,
                    reason: "bad argument".into(),
                }),
                Reply::ApiFailure => Err(LlmError::RequestFailed {
                    provider,
                    reason: "503 unavailable".into(),
                }),
                Reply::Garbled => Err(LlmError::InvalidResponse {
                    provider,
                    reason: "truncated body".into(),
                }),
            }
        }
    }

    struct MockFactory {
        reply: Reply,
        builds: AtomicUsize,
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<GenerateRequest>>>,
    }

    impl MockFactory {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                builds: AtomicUsize::new(0),
                calls: Arc::new(AtomicUsize::new(0)),
                requests: Arc::new(Mutex::new(Vec::new())),
            })
        }
    }

    impl ModelFactory for MockFactory {
        fn build(
            &self,
            _api_key: SecretString,
            _settings: &ModelSettings,
        ) -> Result<Arc<dyn LlmProvider>, LlmError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockModel {
                reply: self.reply.clone(),
                calls: Arc::clone(&self.calls),
                requests: Arc::clone(&self.requests),
            }))
        }
    }

    fn classifier(creds: Arc<SpyCredentials>, factory: Arc<MockFactory>) -> Classifier {
        Classifier::new(ModelClient::new(ModelSettings::default(), creds, factory))
    }

    fn text_reply(raw: &str) -> Reply {
        Reply::Response(ModelResponse::from_text(raw))
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_network() {
        let factory = MockFactory::new(text_reply(r#"{"productive": true}"#));
        let classifier = classifier(SpyCredentials::with_key(None), Arc::clone(&factory));

        let err = classifier
            .classify("Meeting about quarterly roadmap tomorrow.")
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::MissingApiKey);
        assert_eq!(err.to_string(), MISSING_API_KEY_MESSAGE);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);

        let json = serde_json::to_value(ClassificationError::from(err)).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["error", "reason"]);
    }

    #[tokio::test]
    async fn request_has_user_role_and_two_parts() {
        let factory = MockFactory::new(text_reply(r#"{"productive": true}"#));
        let classifier = classifier(SpyCredentials::with_key(Some("k")), Arc::clone(&factory));

        classifier.classify("Project deadline is Friday").await.unwrap();

        let requests = factory.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let content = &requests[0].contents[0];
        assert_eq!(content.role, "user");
        assert_eq!(content.parts.len(), 2);
        assert_eq!(content.parts[0].text, SYSTEM_INSTRUCTION);
        assert!(content.parts[1].text.contains("Project deadline is Friday"));
    }

    #[tokio::test]
    async fn successful_classification_is_normalized() {
        let factory = MockFactory::new(text_reply(
            r#"{"productive": true, "confidence": 0.8, "reason": "has deadline"}"#,
        ));
        let classifier = classifier(SpyCredentials::with_key(Some("k")), factory);

        let result = classifier.classify("Report due tomorrow").await.unwrap();
        assert!(result.productive);
        assert_eq!(result.confidence, Some(serde_json::Value::from(0.8)));
        assert_eq!(result.reason, Some(serde_json::Value::from("has deadline")));
        assert!(result.keywords.is_empty());
        assert_eq!(result.reply, "");
    }

    #[tokio::test]
    async fn provider_failures_map_to_codes() {
        let cases = [
            (Reply::RateLimited, ErrorCode::QuotaExceeded, "Gemini quota exceeded: 429 quota"),
            (Reply::InvalidRequest, ErrorCode::InvalidRequest, "Invalid request to Gemini API: bad argument"),
            (Reply::ApiFailure, ErrorCode::GeminiApiError, "Gemini API error: 503 unavailable"),
            (Reply::Garbled, ErrorCode::UnexpectedError, "Unexpected error: truncated body"),
        ];
        for (reply, code, reason) in cases {
            let classifier = classifier(SpyCredentials::with_key(Some("k")), MockFactory::new(reply));
            let err = classifier.classify("hello").await.unwrap_err();
            assert_eq!(err.code(), code);
            assert_eq!(err.to_string(), reason);
        }
    }

    #[tokio::test]
    async fn normalizer_errors_surface_unchanged() {
        let blocked = classifier(
            SpyCredentials::with_key(Some("k")),
            MockFactory::new(Reply::Response(ModelResponse::blocked("SAFETY"))),
        );
        let err = blocked.classify("hello").await.unwrap_err();
        assert_eq!(err, ClassifyError::PromptBlocked("SAFETY".into()));

        let garbage = classifier(SpyCredentials::with_key(Some("k")), MockFactory::new(text_reply("{not json")));
        let err = garbage.classify("hello").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::JsonParseError);
        assert_eq!(err.original_response(), Some("{not json"));
    }

    #[tokio::test]
    async fn identical_input_yields_identical_output() {
        let factory = MockFactory::new(text_reply(
            r#"{"productive": false, "confidence": 0.9, "reason": "promo", "keywords": ["sale"]}"#,
        ));
        let classifier = classifier(SpyCredentials::with_key(Some("k")), Arc::clone(&factory));

        let first = classifier.classify("Huge sale today").await.unwrap();
        let second = classifier.classify("Huge sale today").await.unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        let requests = factory.requests.lock().unwrap();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn reset_model_reresolves_credentials() {
        let creds = SpyCredentials::with_key(Some("k"));
        let factory = MockFactory::new(text_reply(r#"{"productive": true}"#));
        let classifier = classifier(Arc::clone(&creds), Arc::clone(&factory));

        classifier.classify("first").await.unwrap();
        let after_first = creds.lookups.load(Ordering::SeqCst);
        classifier.classify("second").await.unwrap();
        assert_eq!(creds.lookups.load(Ordering::SeqCst), after_first);

        classifier.reset_model();
        assert!(!classifier.model_client().is_initialized());
        classifier.classify("third").await.unwrap();

        assert!(creds.lookups.load(Ordering::SeqCst) > after_first);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn build_request_is_deterministic() {
        assert_eq!(build_request("same"), build_request("same"));
    }
}
