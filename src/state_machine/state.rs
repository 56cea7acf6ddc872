//! Session state types

use serde::Serialize;

/// Turn state of a session
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input, no request in flight
    #[default]
    Idle,

    /// User message recorded, completion in flight
    AwaitingResponse,
}

impl ConvState {
    /// Check if a turn is in progress
    pub fn is_working(self) -> bool {
        matches!(self, ConvState::AwaitingResponse)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::AwaitingResponse => "awaiting_response",
        }
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub model_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            model_id: model_id.into(),
        }
    }
}
