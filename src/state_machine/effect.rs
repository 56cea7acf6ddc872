//! Effects produced by state transitions

use crate::state_machine::ConvState;
use crate::store::Role;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the session transcript
    AppendMessage { role: Role, content: String },

    /// Send a prompt to the model
    RequestCompletion { prompt: String },

    /// Tell renderers the state changed
    NotifyStateChange { state: ConvState },

    /// Tell renderers the turn finished
    NotifyTurnDone,
}

impl Effect {
    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn notify_state_change(state: ConvState) -> Self {
        Effect::NotifyStateChange { state }
    }
}
