//! Process-wide model client
//!
//! Binds one credential, one model identifier and one sampling configuration.
//! A client whose initialisation failed still exists, but it answers every
//! completion with an `Unavailable` error and never touches the network.

use super::{
    AuthConfigError, GeminiService, GenerationConfig, GenerationError, LlmRequest, LlmResponse,
    LlmService, LoggingService,
};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the provider credential
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Settings needed to build a [`ModelClient`]
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL replacing the public endpoint
    pub gateway: Option<String>,
    pub request_timeout: Duration,
    pub verify_credential: bool,
    pub generation: GenerationConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            gateway: None,
            request_timeout: Duration::from_secs(60),
            verify_credential: false,
            generation: GenerationConfig::default(),
        }
    }
}

/// Handle to the remote model, shared read-only by every session
pub struct ModelClient {
    service: Result<Arc<dyn LlmService>, AuthConfigError>,
    model_id: String,
    generation: GenerationConfig,
}

impl ModelClient {
    /// Validate the credential and build the provider service.
    pub async fn initialize(settings: &ModelSettings) -> Result<Self, AuthConfigError> {
        let api_key = match settings.api_key.as_deref() {
            None => return Err(AuthConfigError::MissingCredential { var: API_KEY_VAR }),
            Some(key) if key.trim().is_empty() => {
                return Err(AuthConfigError::BlankCredential { var: API_KEY_VAR })
            }
            Some(key) => key.trim().to_string(),
        };

        let gemini = GeminiService::new(
            api_key,
            &settings.model,
            settings.gateway.as_deref(),
            settings.request_timeout,
        )?;

        if settings.verify_credential {
            gemini.verify_credential().await?;
        }

        Ok(Self::with_service(
            Arc::new(LoggingService::new(Arc::new(gemini))),
            settings.generation,
        ))
    }

    /// Wrap an already constructed service
    pub fn with_service(service: Arc<dyn LlmService>, generation: GenerationConfig) -> Self {
        Self {
            model_id: service.model_id().to_string(),
            service: Ok(service),
            generation,
        }
    }

    /// A client that failed to initialise
    pub fn unavailable(settings: &ModelSettings, error: AuthConfigError) -> Self {
        Self {
            service: Err(error),
            model_id: settings.model.clone(),
            generation: settings.generation,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        self.service.is_ok()
    }

    /// The initialisation failure, if any
    pub fn init_error(&self) -> Option<&AuthConfigError> {
        self.service.as_ref().err()
    }

    #[cfg(test)]
    pub fn generation(&self) -> GenerationConfig {
        self.generation
    }

    /// Send one prompt to the provider.
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse, GenerationError> {
        match &self.service {
            Ok(service) => {
                service
                    .complete(&LlmRequest::new(prompt, self.generation))
                    .await
            }
            Err(e) => Err(GenerationError::unavailable(format!(
                "Model client not initialised: {e}"
            ))),
        }
    }
}
