//! Runtime for chat sessions
//!
//! Each session runs as its own task owning its transcript. The manager only
//! keeps channel handles; dropping a handle ends the session. A session whose
//! renderer has gone away for the grace period stops by itself and the
//! manager's reaper forgets its handle.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::state_machine::{ConvState, SessionContext, TransitionError};
use crate::store::Message;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Requests accepted by a session runtime
#[derive(Debug)]
pub enum SessionRequest {
    Submit {
        text: String,
        ack: oneshot::Sender<Result<(), TransitionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Snapshot plus a receiver, taken atomically so no update is missed
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SseEvent>)>,
    },
}

/// Transcript and state at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub state: ConvState,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        messages: Vec<Message>,
        state: ConvState,
        model_error: Option<String>,
    },
    Message {
        message: Message,
    },
    StateChange {
        state: ConvState,
    },
    TurnDone,
    Error {
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session {0} has stopped")]
    Closed(String),
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    request_tx: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    /// The runtime has stopped and will answer nothing more
    pub fn is_closed(&self) -> bool {
        self.request_tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionRequest,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request_tx
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed(self.session_id.clone()))?;
        rx.await
            .map_err(|_| SessionError::Closed(self.session_id.clone()))
    }

    /// Submit user text; rejected while a turn is in flight
    pub async fn submit(&self, text: String) -> Result<(), SessionError> {
        self.request(|ack| SessionRequest::Submit { text, ack })
            .await??;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionRequest::Snapshot { reply })
            .await
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SseEvent>), SessionError> {
        self.request(|reply| SessionRequest::Subscribe { reply })
            .await
    }
}

/// Spawn a runtime for a new, empty session
pub fn start_session<L>(
    session_id: impl Into<String>,
    llm_client: Arc<L>,
    request_timeout: Duration,
    detach_grace: Duration,
) -> SessionHandle
where
    L: LlmClient + ?Sized + 'static,
{
    let session_id = session_id.into();
    let context = SessionContext::new(&session_id, llm_client.model_id());

    let (request_tx, request_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = SessionRuntime::new(
        context,
        llm_client,
        request_timeout,
        detach_grace,
        request_rx,
        broadcast_tx,
    );
    tokio::spawn(runtime.run());

    SessionHandle {
        session_id,
        request_tx,
    }
}

/// Manager for all live sessions
pub struct SessionManager {
    llm_client: Arc<dyn LlmClient>,
    request_timeout: Duration,
    detach_grace: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        request_timeout: Duration,
        detach_grace: Duration,
    ) -> Self {
        Self {
            llm_client,
            request_timeout,
            detach_grace,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Periodically drop handles of sessions that stopped on their own.
    /// Exits once the manager is gone.
    pub fn spawn_reaper(self: &Arc<Self>) {
        let manager: Weak<Self> = Arc::downgrade(self);
        let period = self.detach_grace.max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.reap().await;
            }
        });
    }

    /// Forget sessions whose runtime has stopped
    pub async fn reap(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.is_closed());
        let reaped = before - sessions.len();
        if reaped > 0 {
            tracing::info!(reaped, active = sessions.len(), "Reaped stopped sessions");
        }
        reaped
    }

    /// Start a session with an empty transcript and return its ID
    pub async fn create_session(&self) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let handle = start_session(
            session_id.clone(),
            Arc::clone(&self.llm_client),
            self.request_timeout,
            self.detach_grace,
        );

        let active = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), handle);
            sessions.len()
        };
        tracing::info!(session_id = %session_id, active, "Session started");

        session_id
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn submit(&self, session_id: &str, text: String) -> Result<(), SessionError> {
        self.handle(session_id).await?.submit(text).await
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        self.handle(session_id).await?.snapshot().await
    }

    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SseEvent>), SessionError> {
        self.handle(session_id).await?.subscribe().await
    }

    /// Drop the session's handle; its runtime stops and the transcript is gone
    pub async fn end_session(&self, session_id: &str) -> Result<(), SessionError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %session_id, "Session ended");
                Ok(())
            }
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
