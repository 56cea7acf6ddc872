//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::LlmClient;
use super::{start_session, SessionError, SessionHandle, SessionSnapshot, SseEvent};
use crate::llm::{GenerationError, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, GenerationError>>>,
    model_id: String,
    delay: Duration,
    /// Record of all prompts sent
    pub prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: GenerationError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded prompts
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Test Session Harness
// ============================================================================

/// A running session plus a subscription to its renderer events
pub struct TestSession {
    pub handle: SessionHandle,
    pub events: broadcast::Receiver<SseEvent>,
}

impl TestSession {
    pub async fn start<L: LlmClient + 'static>(llm: Arc<L>) -> Self {
        Self::start_with_timeout(llm, Duration::from_secs(2)).await
    }

    pub async fn start_with_timeout<L: LlmClient + 'static>(
        llm: Arc<L>,
        request_timeout: Duration,
    ) -> Self {
        let handle = start_session(
            "test-session",
            llm,
            request_timeout,
            Duration::from_secs(60),
        );
        let (_, events) = handle.subscribe().await.unwrap();
        Self { handle, events }
    }

    pub async fn send_message(&self, text: &str) -> Result<(), SessionError> {
        self.handle.submit(text.to_string()).await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot().await.unwrap()
    }

    /// Wait until the current turn completes
    pub async fn wait_for_done(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Ok(SseEvent::TurnDone)) => return true,
                Ok(Ok(_)) => {}
                Ok(Err(_)) | Err(_) => return false,
            }
        }
    }

    /// Drain events until the turn completes, returning them in order
    pub async fn collect_turn(&mut self, timeout: Duration) -> Vec<SseEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut seen = Vec::new();
        while let Ok(Ok(event)) = tokio::time::timeout_at(deadline, self.events.recv()).await {
            let done = matches!(event, SseEvent::TurnDone);
            seen.push(event);
            if done {
                break;
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AuthConfigError, ModelClient, ModelSettings, API_KEY_VAR};
    use crate::resources::{GENERATION_FAILED_REPLY, UNAVAILABLE_REPLY};
    use crate::state_machine::{ConvState, TransitionError};
    use crate::store::Role;

    fn pairs(snapshot: &SessionSnapshot) -> Vec<(Role, String)> {
        snapshot
            .messages
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_mock_llm_client() {
        let mock = MockLlmClient::new("test-model");
        mock.queue_response(LlmResponse::text("Hello"));

        let response = mock.complete("prompt").await.unwrap();
        assert_eq!(response.text, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.complete("prompt").await.is_err());
        assert_eq!(mock.recorded_prompts().len(), 2);
    }

    /// A single successful turn
    #[tokio::test]
    async fn test_simple_turn() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("You are valid and this will pass."));

        let mut session = TestSession::start(Arc::clone(&llm)).await;
        session.send_message("I feel terrible today").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        let snapshot = session.snapshot().await;
        assert_eq!(
            pairs(&snapshot),
            vec![
                (Role::User, "I feel terrible today".to_string()),
                (
                    Role::Assistant,
                    "You are valid and this will pass.".to_string()
                ),
            ]
        );
        assert_eq!(snapshot.state, ConvState::Idle);

        let prompts = llm.recorded_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("I feel terrible today"));
    }

    /// A transport failure becomes the fallback reply and the session recovers
    #[tokio::test]
    async fn test_failure_then_recovery() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_error(GenerationError::network("Connection failed"));
        llm.queue_response(LlmResponse::text("Glad you came back."));

        let mut session = TestSession::start(llm).await;
        session.send_message("hello?").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[1].role, Role::Assistant);
        assert_eq!(snapshot.messages[1].content, GENERATION_FAILED_REPLY);
        assert_eq!(snapshot.state, ConvState::Idle);

        session.send_message("still there?").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.messages.len(), 4);
        assert_eq!(snapshot.messages[3].content, "Glad you came back.");
    }

    /// A second submission during a turn is rejected, never interleaved
    #[tokio::test]
    async fn test_sequential_turns_and_busy_rejection() {
        let llm = Arc::new(MockLlmClient::new("test-model").with_delay(Duration::from_millis(100)));
        llm.queue_response(LlmResponse::text("first reply"));
        llm.queue_response(LlmResponse::text("second reply"));

        let mut session = TestSession::start(llm).await;
        session.send_message("first").await.unwrap();

        let busy = session.send_message("second").await;
        assert!(matches!(
            busy,
            Err(SessionError::Rejected(TransitionError::AgentBusy))
        ));

        // Snapshots are still answered while the request is in flight
        let mid_turn = session.snapshot().await;
        assert_eq!(mid_turn.state, ConvState::AwaitingResponse);
        assert_eq!(mid_turn.messages.len(), 1);

        assert!(session.wait_for_done(Duration::from_secs(2)).await);
        session.send_message("second").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        let snapshot = session.snapshot().await;
        assert_eq!(
            pairs(&snapshot),
            vec![
                (Role::User, "first".to_string()),
                (Role::Assistant, "first reply".to_string()),
                (Role::User, "second".to_string()),
                (Role::Assistant, "second reply".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_snapshot_idempotent() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("ok"));

        let mut session = TestSession::start(llm).await;
        session.send_message("hi").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        assert_eq!(session.snapshot().await, session.snapshot().await);
    }

    /// Empty text starts no turn and sends nothing to the model
    #[tokio::test]
    async fn test_empty_message_rejected() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        let session = TestSession::start(Arc::clone(&llm)).await;

        let result = session.send_message("").await;
        assert!(matches!(
            result,
            Err(SessionError::Rejected(TransitionError::EmptyMessage))
        ));
        assert!(session.snapshot().await.messages.is_empty());
        assert!(llm.recorded_prompts().is_empty());
    }

    /// An uninitialised model client answers with the connection apology
    #[tokio::test]
    async fn test_unavailable_client_replies_with_fallback() {
        let settings = ModelSettings::default();
        let client = Arc::new(ModelClient::unavailable(
            &settings,
            AuthConfigError::MissingCredential { var: API_KEY_VAR },
        ));

        let mut session = TestSession::start(client).await;
        session.send_message("anyone there?").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[1].content, UNAVAILABLE_REPLY);
    }

    /// A completion that outlives the timeout becomes the fallback
    #[tokio::test]
    async fn test_timeout_becomes_fallback() {
        let llm = Arc::new(MockLlmClient::new("test-model").with_delay(Duration::from_millis(500)));
        llm.queue_response(LlmResponse::text("too late"));

        let mut session =
            TestSession::start_with_timeout(llm, Duration::from_millis(50)).await;
        session.send_message("hello").await.unwrap();
        assert!(session.wait_for_done(Duration::from_secs(2)).await);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[1].content, GENERATION_FAILED_REPLY);
        assert_eq!(snapshot.state, ConvState::Idle);
    }

    /// Renderers see the user message, the state flip, the reply, then done
    #[tokio::test]
    async fn test_renderer_event_order() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("reply"));

        let mut session = TestSession::start(llm).await;
        session.send_message("hi").await.unwrap();
        let events = session.collect_turn(Duration::from_secs(2)).await;

        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], SseEvent::Message { message } if message.role == Role::User));
        assert!(matches!(
            events[1],
            SseEvent::StateChange {
                state: ConvState::AwaitingResponse
            }
        ));
        assert!(matches!(&events[2], SseEvent::Message { message } if message.content == "reply"));
        assert!(matches!(
            events[3],
            SseEvent::StateChange {
                state: ConvState::Idle
            }
        ));
        assert!(matches!(events[4], SseEvent::TurnDone));
    }

    /// Dropping every handle stops the runtime
    #[tokio::test]
    async fn test_dropped_handle_stops_session() {
        let llm = Arc::new(MockLlmClient::new("test-model").with_delay(Duration::from_secs(5)));
        let session = TestSession::start(llm).await;
        session.send_message("hi").await.unwrap();

        let TestSession { handle, mut events } = session;
        drop(handle);

        // Runtime exits, closing the broadcast channel
        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                    break;
                }
            }
        })
        .await;
        assert!(closed.is_ok());
    }
}
