//! Chat Completions adapter
//!
//! Speaks the OpenAI-compatible `/chat/completions` format with bearer
//! authentication. Provider-specific headers (OpenRouter attribution) come
//! from the descriptor.

use super::{
    non_empty, parse_json, read_body, AdapterError, ProviderAdapter, ProviderDescriptor,
    WireFormat,
};
use crate::schemas::openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIErrorResponse,
};
use crate::services::request::GenerateRequest;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

#[derive(Debug, Clone)]
pub struct ChatCompletionsAdapter {
    client: Client,
}

impl ChatCompletionsAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// System message first, then the user prompt
    pub fn build_request(model: &str, request: &GenerateRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_text() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        ChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Prefer the `error.message` of the standard envelope over the raw body
    fn classify(status: StatusCode, body: &str) -> AdapterError {
        match serde_json::from_str::<OpenAIErrorResponse>(body) {
            Ok(envelope) if !envelope.error.message.is_empty() => {
                AdapterError::from_status(status, &envelope.error.message)
            }
            _ => AdapterError::from_status(status, body),
        }
    }
}

#[async_trait]
impl ProviderAdapter for ChatCompletionsAdapter {
    fn wire_format(&self) -> WireFormat {
        WireFormat::ChatCompletionsCompatible
    }

    async fn generate(
        &self,
        descriptor: &ProviderDescriptor,
        model: &str,
        secret: &str,
        request: &GenerateRequest,
    ) -> Result<String, AdapterError> {
        let url = descriptor.endpoint_for(model);
        let body = Self::build_request(model, request);

        tracing::debug!(
            provider = %descriptor.id,
            model = %model,
            url = %url,
            "Calling chat completions API"
        );

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(secret)
            .header("Content-Type", "application/json");
        for (name, value) in &descriptor.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.json(&body).send().await?;
        let text = read_body(response, Self::classify).await?;
        let parsed: ChatCompletionResponse = parse_json(&text)?;
        non_empty(parsed.first_text())
    }
}
