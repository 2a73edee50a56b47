//! Hugging Face Inference API schema definitions
//!
//! Text-generation task payloads for `api-inference.huggingface.co/models/{model}`.

use serde::{Deserialize, Serialize};

/// Text-generation request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationRequest {
    pub inputs: String,
    pub parameters: TextGenerationParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationParameters {
    pub max_new_tokens: u32,
    pub temperature: f32,
    /// Only the continuation is wanted, not the echoed prompt
    pub return_full_text: bool,
}

/// One generated sequence; the endpoint returns a JSON array of these
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedText {
    #[serde(default)]
    pub generated_text: Option<String>,
}

/// Error body, e.g. `{"error": "Model is currently loading", "estimated_time": 20.0}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceError {
    pub error: String,

    #[serde(default)]
    pub estimated_time: Option<f64>,
}
