//! Events that can occur in a session

use crate::llm::{GenerationError, GenerationErrorKind, LlmResponse, Usage};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage { text: String },

    // Model events
    ModelReply { text: String, usage: Usage },
    ModelFailed {
        message: String,
        kind: GenerationErrorKind,
    },
}

impl Event {
    /// Turn the outcome of a completion call into the event fed back to the
    /// state machine.
    pub fn from_completion(result: Result<LlmResponse, GenerationError>) -> Self {
        match result {
            Ok(response) => Event::ModelReply {
                text: response.text,
                usage: response.usage,
            },
            Err(e) => Event::ModelFailed {
                message: e.message,
                kind: e.kind,
            },
        }
    }
}
