//! Session runtime executor

use super::traits::LlmClient;
use super::{SessionRequest, SessionSnapshot, SseEvent};

use crate::llm::GenerationError;
use crate::state_machine::{transition, ConvState, Effect, Event, SessionContext, TransitionError};
use crate::store::{ConversationStore, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runtime for one session: owns the transcript and drives the state machine.
///
/// Requests from the HTTP layer and model outcomes are handled on the same
/// task, so the transcript is never written concurrently.
pub struct SessionRuntime<L>
where
    L: LlmClient + ?Sized + 'static,
{
    context: SessionContext,
    state: ConvState,
    store: ConversationStore,
    llm_client: Arc<L>,
    request_timeout: Duration,
    /// How long the session may sit idle with no renderer attached
    detach_grace: Duration,
    detached_since: Option<Instant>,
    request_rx: mpsc::Receiver<SessionRequest>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    /// Cancels an in-flight completion when the session ends
    llm_cancel_token: CancellationToken,
}

impl<L> SessionRuntime<L>
where
    L: LlmClient + ?Sized + 'static,
{
    pub fn new(
        context: SessionContext,
        llm_client: Arc<L>,
        request_timeout: Duration,
        detach_grace: Duration,
        request_rx: mpsc::Receiver<SessionRequest>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(8);
        Self {
            context,
            state: ConvState::Idle,
            store: ConversationStore::new(),
            llm_client,
            request_timeout,
            detach_grace,
            // A fresh session has no renderer yet
            detached_since: Some(Instant::now()),
            request_rx,
            event_rx,
            event_tx,
            broadcast_tx,
            llm_cancel_token: CancellationToken::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            session_id = %self.context.session_id,
            model = %self.context.model_id,
            "Starting session runtime"
        );

        let mut detach_check = tokio::time::interval(
            (self.detach_grace / 4).max(Duration::from_millis(10)),
        );

        // Runs until every request sender is dropped (session ended) or the
        // renderer has been gone for the grace period
        loop {
            tokio::select! {
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                _ = detach_check.tick() => {
                    if self.renderer_gone() {
                        tracing::info!(
                            session_id = %self.context.session_id,
                            grace_ms = %self.detach_grace.as_millis(),
                            "No renderer attached, ending session"
                        );
                        break;
                    }
                }
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::error!(
                            session_id = %self.context.session_id,
                            error = %e,
                            "Error handling model outcome"
                        );
                        let _ = self.broadcast_tx.send(SseEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        self.llm_cancel_token.cancel();
        tracing::info!(
            session_id = %self.context.session_id,
            messages = self.store.len(),
            "Session runtime stopped"
        );
    }

    fn handle_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::Submit { text, ack } => {
                let result = self.process_event(Event::UserMessage { text });
                if let Err(e) = &result {
                    tracing::info!(
                        session_id = %self.context.session_id,
                        reason = %e,
                        "User message rejected"
                    );
                }
                let _ = ack.send(result);
            }
            SessionRequest::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionRequest::Subscribe { reply } => {
                let _ = reply.send((self.snapshot(), self.broadcast_tx.subscribe()));
            }
        }
    }

    /// True once no subscriber has been attached for `detach_grace` while
    /// idle. A turn in flight keeps the session alive.
    fn renderer_gone(&mut self) -> bool {
        if self.broadcast_tx.receiver_count() > 0 || self.state.is_working() {
            self.detached_since = None;
            return false;
        }
        let since = *self.detached_since.get_or_insert_with(Instant::now);
        since.elapsed() >= self.detach_grace
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.store.snapshot(),
            state: self.state,
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        match &event {
            Event::ModelReply { usage, .. } => tracing::debug!(
                session_id = %self.context.session_id,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Model reply received"
            ),
            Event::ModelFailed { message, kind } => tracing::warn!(
                session_id = %self.context.session_id,
                error = %message,
                error_kind = kind.as_str(),
                "Completion failed, replying with fallback"
            ),
            Event::UserMessage { .. } => {}
        }

        // Pure state transition
        let result = transition(self.state, event)?;

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        tracing::debug!(
            session_id = %self.context.session_id,
            from = old_state.as_str(),
            to = self.state.as_str(),
            "State transition"
        );

        for effect in result.effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { role, content } => {
                let message = Message::new(role, content);
                self.store.append(message.clone());
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }
            Effect::RequestCompletion { prompt } => self.spawn_completion(prompt),
            Effect::NotifyStateChange { state } => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange { state });
            }
            Effect::NotifyTurnDone => {
                let _ = self.broadcast_tx.send(SseEvent::TurnDone);
            }
        }
    }

    /// Run the completion off the session task; the outcome comes back as an
    /// event so snapshots stay answerable meanwhile.
    fn spawn_completion(&self, prompt: String) {
        let client = Arc::clone(&self.llm_client);
        let event_tx = self.event_tx.clone();
        let cancel = self.llm_cancel_token.clone();
        let timeout = self.request_timeout;
        let session_id = self.context.session_id.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!(session_id = %session_id, "Completion abandoned");
                    return;
                }
                result = tokio::time::timeout(timeout, client.complete(&prompt)) => {
                    result.unwrap_or_else(|_| {
                        Err(GenerationError::timeout(format!(
                            "No reply within {}ms",
                            timeout.as_millis()
                        )))
                    })
                }
            };

            if event_tx.send(Event::from_completion(outcome)).await.is_err() {
                tracing::debug!(session_id = %session_id, "Session gone before reply arrived");
            }
        });
    }
}
