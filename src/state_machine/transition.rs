//! Pure state transition function
//!
//! Idle + user text -> `AwaitingResponse` (user message recorded, prompt sent).
//! `AwaitingResponse` + model outcome -> Idle (assistant message recorded).
//! Anything else is rejected without touching the transcript.

use super::{ConvState, Effect, Event};
use crate::llm::GenerationErrorKind;
use crate::prompt::build_prompt;
use crate::resources::{GENERATION_FAILED_REPLY, UNAVAILABLE_REPLY};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still working on a reply, wait for it before sending another message")]
    AgentBusy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Apology text shown in place of a model reply.
pub fn fallback_reply(kind: GenerationErrorKind) -> &'static str {
    match kind {
        GenerationErrorKind::Unavailable => UNAVAILABLE_REPLY,
        _ => GENERATION_FAILED_REPLY,
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(state: ConvState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Only the literally empty string is refused; whitespace goes to the model.
        (_, Event::UserMessage { text }) if text.is_empty() => Err(TransitionError::EmptyMessage),

        (ConvState::Idle, Event::UserMessage { text }) => {
            let prompt = build_prompt(&text);
            Ok(TransitionResult::new(ConvState::AwaitingResponse)
                .with_effect(Effect::append_user(text))
                .with_effect(Effect::notify_state_change(ConvState::AwaitingResponse))
                .with_effect(Effect::RequestCompletion { prompt }))
        }

        (ConvState::AwaitingResponse, Event::UserMessage { .. }) => {
            Err(TransitionError::AgentBusy)
        }

        (ConvState::AwaitingResponse, Event::ModelReply { text, .. }) => {
            Ok(finish_turn(text))
        }

        (ConvState::AwaitingResponse, Event::ModelFailed { kind, .. }) => {
            Ok(finish_turn(fallback_reply(kind).to_string()))
        }

        (ConvState::Idle, event @ (Event::ModelReply { .. } | Event::ModelFailed { .. })) => {
            Err(TransitionError::InvalidTransition(format!(
                "model outcome while idle: {event:?}"
            )))
        }
    }
}

fn finish_turn(reply: String) -> TransitionResult {
    TransitionResult::new(ConvState::Idle)
        .with_effect(Effect::append_assistant(reply))
        .with_effect(Effect::notify_state_change(ConvState::Idle))
        .with_effect(Effect::NotifyTurnDone)
}
