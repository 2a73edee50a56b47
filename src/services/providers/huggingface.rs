//! Hugging Face text-generation adapter
//!
//! The Inference API takes a single `inputs` string, so the system
//! instruction is prepended to the prompt.

use super::{
    classify_status, non_empty, parse_json, read_body, AdapterError, ProviderAdapter,
    ProviderDescriptor, WireFormat, MAX_ERROR_BODY_CHARS,
};
use crate::schemas::huggingface::{
    GeneratedText, HuggingFaceError, TextGenerationParameters, TextGenerationRequest,
};
use crate::services::request::GenerateRequest;
use crate::utils::summarize_body;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

#[derive(Debug, Clone)]
pub struct TextGenerationAdapter {
    client: Client,
}

impl TextGenerationAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn build_request(request: &GenerateRequest) -> TextGenerationRequest {
        let inputs = match request.system_text() {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };

        TextGenerationRequest {
            inputs,
            parameters: TextGenerationParameters {
                max_new_tokens: request.max_tokens,
                temperature: request.temperature,
                return_full_text: false,
            },
        }
    }

    fn classify(status: StatusCode, body: &str) -> AdapterError {
        let message = match serde_json::from_str::<HuggingFaceError>(body) {
            Ok(HuggingFaceError {
                error,
                estimated_time: Some(eta),
            }) => format!("{} (estimated {:.0}s)", error, eta),
            Ok(HuggingFaceError { error, .. }) => error,
            Err(_) => body.to_string(),
        };

        AdapterError::Rejected {
            status: status.as_u16(),
            kind: classify_status(status),
            message: summarize_body(&message, MAX_ERROR_BODY_CHARS),
        }
    }
}

#[async_trait]
impl ProviderAdapter for TextGenerationAdapter {
    fn wire_format(&self) -> WireFormat {
        WireFormat::Bespoke
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

        tracing::debug!(
            provider = %descriptor.id,
            model = %model,
            url = %url,
            "Calling text-generation API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(secret)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let text = read_body(response, Self::classify).await?;
        let parsed: Vec<GeneratedText> = parse_json(&text)?;
        non_empty(parsed.first().and_then(|g| g.generated_text.as_deref()))
    }
}
