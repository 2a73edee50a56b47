//! Schema module
//!
//! Wire-format request/response types for each provider family.

pub mod gemini;
pub mod huggingface;
pub mod openai;
