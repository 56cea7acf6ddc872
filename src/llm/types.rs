//! Common types for LLM interactions

use serde::Serialize;

/// Sampling parameters sent with every completion.
///
/// Fixed for the process lifetime; built once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// LLM request: one prompt plus the sampling parameters to use
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub generation: GenerationConfig,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, generation: GenerationConfig) -> Self {
        Self {
            prompt: prompt.into(),
            generation,
        }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Usage,
}

impl LlmResponse {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: Some("STOP".to_string()),
            usage: Usage::default(),
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
