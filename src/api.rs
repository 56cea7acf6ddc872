//! HTTP API: the renderer's view of sessions

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::llm::ModelClient;
use crate::runtime::{LlmClient, SessionManager};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of model client initialisation, shown to every renderer
#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub model: String,
    pub error: Option<String>,
}

impl ModelStatus {
    pub fn from_client(client: &ModelClient) -> Self {
        Self {
            model: client.model_id().to_string(),
            error: client.init_error().map(ToString::to_string),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.error.is_none()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub model_status: Arc<ModelStatus>,
}

impl AppState {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        model_status: ModelStatus,
        request_timeout: Duration,
        session_grace: Duration,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            llm_client,
            request_timeout,
            session_grace,
        ));
        sessions.spawn_reaper();

        Self {
            sessions,
            model_status: Arc::new(model_status),
        }
    }
}
