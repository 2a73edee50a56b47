//! Generative Content adapter
//!
//! Speaks Google's `generateContent` REST format. The key travels in the
//! `key` query parameter.

use super::{
    classify_status, non_empty, parse_json, read_body, AdapterError, ProviderAdapter,
    ProviderDescriptor, WireFormat, MAX_ERROR_BODY_CHARS,
};
use crate::error::FailureKind;
use crate::schemas::gemini::{
    GeminiContent, GeminiError, GeminiRequest, GeminiResponse, GenerationConfig,
};
use crate::services::request::GenerateRequest;
use crate::utils::summarize_body;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

#[derive(Debug, Clone)]
pub struct GenerativeContentAdapter {
    client: Client,
}

impl GenerativeContentAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn build_request(request: &GenerateRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent::user(request.prompt.clone())],
            system_instruction: request.system_text().map(GeminiContent::system),
            generation_config: Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            }),
        }
    }

    /// Gemini answers an invalid key with 400 `API_KEY_INVALID` rather than 401
    fn classify(status: StatusCode, body: &str) -> AdapterError {
        let mut kind = classify_status(status);
        let mut message = summarize_body(body, MAX_ERROR_BODY_CHARS);

        if let Ok(error) = serde_json::from_str::<GeminiError>(body) {
            if status == StatusCode::BAD_REQUEST
                && (body.contains("API_KEY_INVALID") || error.error.message.contains("API key not valid"))
            {
                kind = FailureKind::AuthRejected;
            }
            message = summarize_body(&error.error.message, MAX_ERROR_BODY_CHARS);
        }

        AdapterError::Rejected {
            status: status.as_u16(),
            kind,
            message,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GenerativeContentAdapter {
    fn wire_format(&self) -> WireFormat {
        WireFormat::GenerativeContent
    }

    async fn generate(
        &self,
        descriptor: &ProviderDescriptor,
        model: &str,
        secret: &str,
        request: &GenerateRequest,
    ) -> Result<String, AdapterError> {
        let url = descriptor.endpoint_for(model);
        let body = Self::build_request(request);

        // The URL is logged before the key is attached
        tracing::debug!(
            provider = %descriptor.id,
            model = %model,
            url = %url,
            "Calling Gemini generateContent API"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", secret)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::Http(e.without_url()))?;

        let text = read_body(response, Self::classify).await?;
        let parsed: GeminiResponse = parse_json(&text)?;
        non_empty(parsed.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn descriptor(server: &MockServer) -> ProviderDescriptor {
        ProviderDescriptor::new(
            "gemini",
            WireFormat::GenerativeContent,
            format!("{}/v1beta/models/{{model}}:generateContent", server.uri()),
            &["gemini-1.5-flash"],
        )
    }

    fn adapter() -> GenerativeContentAdapter {
        GenerativeContentAdapter::new(Client::new())
    }

    #[tokio::test]
    async fn test_sends_wire_format_and_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "AIzaSyTestKey0001"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Say hi"}]}],
                "systemInstruction": {"parts": [{"text": "You are terse."}]},
                "generationConfig": {"maxOutputTokens": 32, "temperature": 0.5}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "hi"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = GenerateRequest::new("Say hi")
            .with_system("You are terse.")
            .with_max_tokens(32)
            .with_temperature(0.5);
        let text = adapter()
            .generate(&descriptor(&server), "gemini-1.5-flash", "AIzaSyTestKey0001", &request)
            .await
            .unwrap();
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_invalid_key_on_bad_request_is_auth_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT",
                    "details": [{"reason": "API_KEY_INVALID"}]
                }
            })))
            .mount(&server)
            .await;

        let err = adapter()
            .generate(&descriptor(&server), "gemini-1.5-flash", "AIzaSyRevoked001", &GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::AuthRejected);
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_other_bad_request_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "Invalid JSON payload", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = adapter()
            .generate(&descriptor(&server), "gemini-1.5-flash", "AIzaSyTestKey0001", &GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransientFailure);
    }

    #[tokio::test]
    async fn test_resource_exhausted_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = adapter()
            .generate(&descriptor(&server), "gemini-1.5-flash", "AIzaSyTestKey0001", &GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::RateLimited);
    }

    #[tokio::test]
    async fn test_blocked_candidate_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let err = adapter()
            .generate(&descriptor(&server), "gemini-1.5-flash", "AIzaSyTestKey0001", &GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::EmptyResponse));
    }

    #[test]
    fn test_request_without_system_omits_instruction() {
        let body = GenerativeContentAdapter::build_request(&GenerateRequest::new("hello"));
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }
}
