//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::llm::{GenerationError, LlmResponse, ModelClient};
use async_trait::async_trait;

/// Client for making LLM requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete one prompt
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, GenerationError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl LlmClient for ModelClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, GenerationError> {
        ModelClient::complete(self, prompt).await
    }

    fn model_id(&self) -> &str {
        ModelClient::model_id(self)
    }
}
