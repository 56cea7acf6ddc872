//! Google Gemini provider implementation

use super::error::AuthConfigError;
use super::types::{GenerationConfig, LlmRequest, LlmResponse, Usage};
use super::{GenerationError, LlmService};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(
        api_key: String,
        model_id: &str,
        gateway: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AuthConfigError> {
        let base_url = gateway
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model_id: model_id.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_id)
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model_id)
    }

    /// Ask the provider for this model's metadata, which fails when the key
    /// is rejected. Network trouble is not treated as a rejection.
    pub async fn verify_credential(&self) -> Result<(), AuthConfigError> {
        let response = match self
            .client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Could not reach provider to verify credential");
                return Ok(());
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body).unwrap_or(body);
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthConfigError::Rejected(message))
            }
            _ => {
                tracing::warn!(status = %status, message = %message, "Credential check inconclusive");
                Ok(())
            }
        }
    }
}

pub(crate) fn translate_request(request: &LlmRequest) -> GeminiRequest {
    let GenerationConfig {
        temperature,
        top_p,
        top_k,
        max_output_tokens,
    } = request.generation;

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
            }],
        }],
        generation_config: GeminiGenerationConfig {
            temperature,
            top_p,
            top_k,
            max_output_tokens,
        },
    }
}

pub(crate) fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, GenerationError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::empty_response(format!(
            "Prompt blocked by provider: {reason}"
        )));
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::empty_response("No candidates in response"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::empty_response(format!(
            "Candidate has no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("none")
        )));
    }

    let usage = resp.usage_metadata.unwrap_or_default();
    Ok(LlmResponse {
        text,
        finish_reason: candidate.finish_reason,
        usage: Usage {
            input_tokens: u64::from(usage.prompt_token_count),
            output_tokens: u64::from(usage.candidates_token_count),
        },
    })
}

/// Classify a non-success HTTP status
pub(crate) fn error_for_status(status: StatusCode, message: &str) -> GenerationError {
    match status.as_u16() {
        400 => GenerationError::invalid_request(format!("Invalid request: {message}")),
        401 | 403 => GenerationError::auth(format!("Authentication failed: {message}")),
        408 | 504 => GenerationError::timeout(format!("Provider timed out: {message}")),
        429 => GenerationError::rate_limit(format!("Rate limit exceeded: {message}")),
        500..=599 => GenerationError::server_error(format!("Server error: {message}")),
        _ => GenerationError::unknown(format!("HTTP {status}: {message}")),
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiErrorResponse>(body)
        .ok()
        .map(|r| r.error.message)
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, GenerationError> {
        let gemini_request = translate_request(request);

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GenerationError::network(format!("Connection failed: {e}"))
                } else {
                    GenerationError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = parse_error_message(&body).unwrap_or(body);
            return Err(error_for_status(status, &message));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        normalize_response(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
